//! Per-address queues of pre-published nonce commitments.
//!
//! A queue only ever moves forward: `tail` grows on submission and `head` on
//! consumption or reset, so an index handed out once is never handed out again.

use crate::tss::error::{Error, Result};
use crate::tss::keeper::Keeper;
use crate::tss::types::{Context, DEQueue, DE};

use log::{debug, info};

impl Keeper {
    pub fn submit_des(&mut self, ctx: &Context, address: &str, des: Vec<DE>) -> Result<()> {
        if des.is_empty() {
            return Err(Error::InvalidArgument("no DE submitted".to_string()));
        }
        for de in &des {
            de.pub_d.validate_basic().map_err(|e| Error::InvalidDE(e.to_string()))?;
            de.pub_e.validate_basic().map_err(|e| Error::InvalidDE(e.to_string()))?;
        }

        let mut queue = self.store.de_queue(address);
        let count = queue.len() + des.len() as u64;
        if count > self.params.max_de_size {
            return Err(Error::DEQueueFull { address: address.to_string(), count, max: self.params.max_de_size });
        }

        for de in des {
            self.store.des.insert((address.to_string(), queue.tail), de);
            queue.tail += 1;
        }
        self.store.de_queues.insert(address.to_string(), queue);
        debug!("{} holds {} DEs at height {}", address, queue.len(), ctx.block_height);
        Ok(())
    }

    /// Hands out the oldest unused DE of `address`.
    pub fn pop_de(&mut self, address: &str) -> Result<DE> {
        let mut queue = self.store.de_queue(address);
        if queue.is_empty() {
            return Err(Error::NoDE(address.to_string()));
        }
        let de = self
            .store
            .des
            .remove(&(address.to_string(), queue.head))
            .ok_or_else(|| Error::Internal(format!("DE {} of {} is missing", queue.head, address)))?;
        queue.head += 1;
        self.store.de_queues.insert(address.to_string(), queue);
        Ok(de)
    }

    /// Drops every unused DE of `address`.
    pub fn reset_de(&mut self, address: &str) {
        let mut queue = self.store.de_queue(address);
        for index in queue.head..queue.tail {
            self.store.des.remove(&(address.to_string(), index));
        }
        queue.head = queue.tail;
        self.store.de_queues.insert(address.to_string(), queue);
        info!("reset DEs of {}", address);
    }

    pub fn de_queue(&self, address: &str) -> DEQueue {
        self.store.de_queue(address)
    }

    pub fn de_count(&self, address: &str) -> u64 {
        self.store.de_queue(address).len()
    }

    pub fn has_de(&self, address: &str) -> bool {
        !self.store.de_queue(address).is_empty()
    }

    /// Unused DEs of `address` in queue order.
    pub fn des(&self, address: &str) -> Vec<DE> {
        let queue = self.store.de_queue(address);
        (queue.head..queue.tail)
            .filter_map(|index| self.store.des.get(&(address.to_string(), index)).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecpoint::ECPoint;
    use crate::tss::test_utils::*;
    use k256::Scalar;
    use std::collections::HashSet;

    fn de(i: u64) -> DE {
        DE {
            pub_d: ECPoint::scalar_base_mult(&Scalar::from(2 * i + 1)),
            pub_e: ECPoint::scalar_base_mult(&Scalar::from(2 * i + 2)),
        }
    }

    #[test]
    fn test_submit_and_pop_fifo() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        keeper.submit_des(&ctx, "band1a", vec![de(0), de(1)]).unwrap();
        keeper.submit_des(&ctx, "band1a", vec![de(2)]).unwrap();
        assert_eq!(keeper.de_count("band1a"), 3);
        assert_eq!(keeper.des("band1a"), vec![de(0), de(1), de(2)]);

        assert_eq!(keeper.pop_de("band1a").unwrap(), de(0));
        assert_eq!(keeper.pop_de("band1a").unwrap(), de(1));
        assert_eq!(keeper.de_queue("band1a"), DEQueue { head: 2, tail: 3 });
        assert_eq!(keeper.pop_de("band1a").unwrap(), de(2));

        assert!(!keeper.has_de("band1a"));
        assert!(matches!(keeper.pop_de("band1a"), Err(Error::NoDE(_))));
        assert!(matches!(keeper.pop_de("band1b"), Err(Error::NoDE(_))));
    }

    #[test]
    fn test_popped_de_is_never_reissued() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        keeper.submit_des(&ctx, "band1a", (0..5).map(de).collect()).unwrap();
        let mut seen = HashSet::new();
        for _ in 0..3 {
            let popped = keeper.pop_de("band1a").unwrap();
            assert!(seen.insert(popped.pub_d.to_bytes()));
        }
        // resubmitting the same points appends new slots; the queue index stays authoritative
        keeper.submit_des(&ctx, "band1a", vec![de(0)]).unwrap();
        assert_eq!(keeper.de_queue("band1a"), DEQueue { head: 3, tail: 6 });
        assert_eq!(keeper.pop_de("band1a").unwrap(), de(3));
    }

    #[test]
    fn test_queue_full() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        let max = keeper.params().max_de_size;
        keeper.submit_des(&ctx, "band1a", (0..max).map(de).collect()).unwrap();
        assert!(matches!(
            keeper.submit_des(&ctx, "band1a", vec![de(max)]),
            Err(Error::DEQueueFull { .. })
        ));
        assert_eq!(keeper.de_count("band1a"), max);

        keeper.pop_de("band1a").unwrap();
        assert!(keeper.submit_des(&ctx, "band1a", vec![de(max)]).is_ok());
    }

    #[test]
    fn test_invalid_and_empty_submissions() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        assert!(matches!(keeper.submit_des(&ctx, "band1a", vec![]), Err(Error::InvalidArgument(_))));
        let bad = DE { pub_d: ECPoint::identity(), pub_e: de(0).pub_e };
        assert!(matches!(keeper.submit_des(&ctx, "band1a", vec![de(1), bad]), Err(Error::InvalidDE(_))));
        assert_eq!(keeper.de_count("band1a"), 0);
    }

    #[test]
    fn test_reset_de() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        keeper.submit_des(&ctx, "band1a", (0..4).map(de).collect()).unwrap();
        keeper.pop_de("band1a").unwrap();
        keeper.reset_de("band1a");
        assert_eq!(keeper.de_queue("band1a"), DEQueue { head: 4, tail: 4 });
        assert!(keeper.store.des.is_empty());

        keeper.submit_des(&ctx, "band1a", vec![de(9)]).unwrap();
        assert_eq!(keeper.pop_de("band1a").unwrap(), de(9));
    }
}
