// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

pub mod complaint;
pub mod signature;

pub use complaint::ComplaintSignature;
pub use signature::{sign, verify, SchnorrError, Signature};
