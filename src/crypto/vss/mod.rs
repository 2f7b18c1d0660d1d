// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

pub mod encryption;
pub mod feldman_vss;
pub mod round1;
pub mod round3;

pub use feldman_vss::VssError;
pub use round1::{Round1Info, Round1Output};
