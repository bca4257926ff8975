pub const POOL_AUTHORITY_SEED: &[u8] = b"pool-authority";
