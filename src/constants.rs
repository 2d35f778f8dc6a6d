/// Serialized form of the symbolic "any unseen allele" token, as it appears in
/// gVCF-style inputs. Inside the core the token is the `Allele::NonRef` enum
/// case; this literal exists only at the input/output boundary.
pub const NON_REF_ALLELE: &str = "<NON_REF>";

/// Replacement REF for calls that continue an upstream deletion. Their REF
/// carries no sequence content and is excluded from the prefix invariant.
pub const PLACEHOLDER_REF: &str = "N";

pub const DEFAULT_PLOIDY: usize = 2;
pub const DEFAULT_NUM_THREADS: usize = 1;
pub const DEFAULT_BLOCK_SIZE: usize = 128;
pub const DEFAULT_PERMISSIVE_REF: bool = false;

/// Queue slots per worker thread in the merge pipeline.
pub const QUEUE_SLOTS_PER_THREAD: usize = 2;
