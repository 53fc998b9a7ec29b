//! # Protocol Configuration & Constants
//!
//! Every seed, decimal count and limit in Vaultline lives here. Derived
//! addresses are a pure function of these seeds, so changing one after
//! records exist orphans every record derived from it. Don't.

// ---------------------------------------------------------------------------
// Program Identity
// ---------------------------------------------------------------------------

/// Version of the record and derivation layout.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Seed hashed into the program identifier. Every derived address is scoped
/// to the program identifier, so two deployments with different seeds never
/// share an address space.
pub const PROGRAM_ID_SEED: &str = "vaultline-core-v1";

/// Program identifier for the associated-account scheme of the asset ledger.
/// Kept separate from the core's identifier so ledger-owned addresses and
/// core-owned addresses live in disjoint namespaces.
pub const TOKEN_PROGRAM_ID_SEED: &str = "vaultline-token-v1";

/// Suffix appended to every derivation preimage. Makes derived-address
/// preimages distinguishable from any other SHA-256 input in the system.
pub const DERIVED_ADDRESS_MARKER: &[u8] = b"VaultlineDerivedAddress";

/// BLAKE3 key-derivation context for signer messages. Signers sign the
/// digest under this context, never raw bytes.
pub const SIGNER_CONTEXT: &str = "vaultline 2026-10 signer message v1";

// ---------------------------------------------------------------------------
// Derivation Seeds (domain tags)
// ---------------------------------------------------------------------------

/// GlobalState singleton: `derive(["state"])`.
pub const STATE_SEED: &[u8] = b"state";

/// Claim-asset mint: `derive(["claim_mint"])`.
pub const CLAIM_MINT_SEED: &[u8] = b"claim_mint";

/// Reserve controller custody account: `derive(["controller", reserve_asset])`.
pub const CONTROLLER_SEED: &[u8] = b"controller";

/// Branch record: `derive(["branch", vault])` or `derive(["branch", vault, salt])`.
pub const BRANCH_SEED: &[u8] = b"branch";

/// Branch ownership capability mint: `derive(["mint", branch])`.
pub const CAPABILITY_MINT_SEED: &[u8] = b"mint";

/// Associated token account: `derive([owner, "associated", asset])` under the
/// token program identifier.
pub const ASSOCIATED_ACCOUNT_SEED: &[u8] = b"associated";

// ---------------------------------------------------------------------------
// Derivation Limits
// ---------------------------------------------------------------------------

/// Maximum number of seeds (the bump byte included) in one derivation.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes. Addresses are 32 bytes, so
/// every parent identifier fits.
pub const MAX_SEED_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Claim asset precision. Matches the reserve stablecoin it is redeemed for.
pub const CLAIM_ASSET_DECIMALS: u8 = 6;

/// Branch ownership capabilities are indivisible.
pub const CAPABILITY_DECIMALS: u8 = 0;

/// Exactly one capability unit exists per branch.
pub const CAPABILITY_SUPPLY: u64 = 1;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Capacity of a vault's Positions index.
pub const MAX_POSITIONS: usize = 5;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Public key / address length in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;
