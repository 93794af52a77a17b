#[cfg(test)]
mod tests {
    use crate::accounting::Allocation;
    use crate::error::PoolError;

    #[test]
    fn test_fixed_pool_commits_everything() {
        let alloc = Allocation::fixed(2);
        assert_eq!(alloc.ceiling(), 2);
        assert_eq!(alloc.available(0), 2);
        assert_eq!(alloc.available(2), 0);
        assert!(alloc.in_commit(2));
        assert_eq!(alloc.overage(2), 0);
        assert!(alloc.admits(1));
        assert!(!alloc.admits(2));
    }

    #[test]
    fn test_commit_and_overage_band() {
        // 20 provisioned, 5 committed, up to 15 more in overage
        let alloc = Allocation::with_commit(20, 5, 15).unwrap();
        assert_eq!(alloc.ceiling(), 20);

        let at_commit = alloc.snapshot("davinci", 5);
        assert!(at_commit.in_commit);
        assert_eq!(at_commit.overage, 0);
        assert_eq!(at_commit.available, 15);

        let past_commit = alloc.snapshot("davinci", 6);
        assert!(!past_commit.in_commit);
        assert_eq!(past_commit.overage, 1);
        assert_eq!(past_commit.available, 14);
        assert_eq!(past_commit.commit, 5);
        assert_eq!(past_commit.max_overage, 15);
    }

    #[test]
    fn test_ceiling_below_total() {
        let alloc = Allocation::with_commit(10, 3, 2).unwrap();
        assert_eq!(alloc.ceiling(), 5);
        assert_eq!(alloc.available(5), 0);
        assert!(!alloc.admits(5));
        assert_eq!(alloc.snapshot("sim", 5).total, 10);
    }

    #[test]
    fn test_next_is_overage() {
        let alloc = Allocation::with_commit(4, 2, 2).unwrap();
        assert!(!alloc.next_is_overage(0));
        assert!(!alloc.next_is_overage(1));
        assert!(alloc.next_is_overage(2));
    }

    #[test]
    fn test_allocation_rejects_terms_beyond_total() {
        assert!(matches!(
            Allocation::with_commit(5, 4, 2),
            Err(PoolError::InvalidAllocation(_))
        ));
        assert!(matches!(
            Allocation::with_commit(5, u32::MAX, 1),
            Err(PoolError::InvalidAllocation(_))
        ));
    }

    #[test]
    fn test_counts_saturate_when_over_ceiling() {
        // A pool re-provisioned below its outstanding leases
        let alloc = Allocation::fixed(1);
        let status = alloc.snapshot("cad_tool", 3);
        assert_eq!(status.available, 0);
        assert_eq!(status.overage, 2);
        assert!(!status.in_commit);
    }

    #[test]
    fn test_pricing_drives_status_costs() {
        let alloc = Allocation::with_commit(20, 5, 15)
            .unwrap()
            .with_pricing(5000.0, 500.0)
            .unwrap();

        let within = alloc.snapshot("davinci", 5);
        assert_eq!(within.commit_price, 5000.0);
        assert_eq!(within.current_overage_cost, 0.0);
        assert_eq!(within.total_cost, 5000.0);

        let over = alloc.snapshot("davinci", 8);
        assert_eq!(over.current_overage_cost, 1500.0);
        assert_eq!(over.total_cost, 6500.0);
    }

    #[test]
    fn test_unpriced_allocation_costs_nothing() {
        let status = Allocation::with_commit(4, 1, 3).unwrap().snapshot("sim", 4);
        assert_eq!(status.overage, 3);
        assert_eq!(status.commit_price, 0.0);
        assert_eq!(status.total_cost, 0.0);
    }

    #[test]
    fn test_pricing_rejects_negative_or_nan() {
        let alloc = Allocation::fixed(2);
        assert!(matches!(
            alloc.with_pricing(-1.0, 0.0),
            Err(PoolError::InvalidAllocation(_))
        ));
        assert!(matches!(
            alloc.with_pricing(0.0, f64::NAN),
            Err(PoolError::InvalidAllocation(_))
        ));
    }
}
