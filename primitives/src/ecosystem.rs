//! Ecosystem Constants for the SHIELD Protocol
//!
//! This module centralizes all system-level constants: dedicated pallet IDs for
//! deriving protocol-owned accounts, and the fundamental economic parameters of the
//! intent settlement and capital deployment machinery.
//!
//! These constants are the single source of truth for system architecture and are
//! re-used across all runtime configurations via the primitives crate.

/// Balance type alias for consistency across the ecosystem
pub type Balance = u128;

/// Local asset identifier for reserve stablecoins (pallet-assets)
pub type AssetId = u32;

/// Basket weights, tolerances and buffers are expressed in basis points
pub type BasisPoints = u32;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// These IDs are used by Polkadot SDK's `PalletId::into_account_truncating()`
/// to deterministically generate accounts for pallet-specific operations.
pub mod pallet_ids {
  /// Shield Vault pallet ID (intent escrow account)
  pub const SHIELD_VAULT_PALLET_ID: &[u8; 8] = b"shdvault";

  /// Basket Manager pallet ID (reserve ledger account)
  pub const BASKET_MANAGER_PALLET_ID: &[u8; 8] = b"bsktmngr";

  /// Venue Adapter pallet ID (order collateral and execution-fee escrow)
  pub const VENUE_ADAPTER_PALLET_ID: &[u8; 8] = b"venueadp";

  /// Protocol treasury identifier (receives fee-equivalent share mints)
  pub const TREASURY_PALLET_ID: &[u8; 8] = b"shdtrsry";
}

/// Economic parameters defining mathematical constants and thresholds.
///
/// These parameters are global across all pallets and coordinate the settlement
/// and capital deployment properties of the system.
pub mod params {
  use super::{Balance, BasisPoints};
  use sp_arithmetic::Permill;

  /// Precision scalar for all USD-denominated calculations (10^18).
  ///
  /// Every USD value in the protocol is an 18-decimal fixed-point `u128`; source
  /// asset amounts are normalized to this precision before any arithmetic and
  /// denormalized back at the boundary. Division truncates toward zero.
  pub const PRECISION: Balance = 1_000_000_000_000_000_000;

  /// Denominator for basis-point arithmetic (100% == 10_000 bps).
  pub const BPS_DENOMINATOR: Balance = 10_000;

  /// NAV deviation tolerance between intent creation and execution (0.5%).
  ///
  /// When the NAV observed at execution deviates from the locked NAV by more than
  /// this many basis points, settlement is priced at the current NAV instead of
  /// the locked snapshot, bounding oracle staleness risk.
  pub const NAV_DEVIATION_TOLERANCE_BPS: BasisPoints = 50;

  /// Buffer added to the close percentage on partial position liquidations (5%).
  ///
  /// Absorbs price movement and venue fees between the close request and its
  /// asynchronous execution. Applied to the percentage to close, clamped at 100%.
  pub const OVER_CLOSE_BUFFER_BPS: BasisPoints = 500;

  /// Weight deviation band outside which a rebalance leg is issued (5%).
  pub const REBALANCE_TOLERANCE_BPS: BasisPoints = 500;

  /// Fraction of total managed value kept as idle reserves (10%).
  ///
  /// Guarantees instant small withdrawals without touching venue positions.
  pub const EMERGENCY_BUFFER_BPS: BasisPoints = 1_000;

  /// Rolling-window redemption volume cap as a fraction of share supply (10%).
  pub const MAX_WINDOW_REDEEM_BPS: BasisPoints = 1_000;

  /// Distinct redeemers per rolling window above which cooldowns double.
  pub const CONGESTION_REDEEMER_THRESHOLD: u32 = 10;

  /// Cooldown multiplier under congestion (more than the threshold of distinct
  /// redeemers in the current window).
  pub const CONGESTION_COOLDOWN_MULTIPLIER: u32 = 2;

  /// Cooldown multiplier for a user redeeming again within the same window.
  pub const REPEAT_REDEEMER_COOLDOWN_MULTIPLIER: u32 = 3;

  /// Mint fee charged on deposits, minted to the treasury as shares (0.3%).
  pub const MINT_FEE: Permill = Permill::from_parts(3_000);

  /// Redeem fee charged on redemptions, paid to the treasury as shares (0.3%).
  pub const REDEEM_FEE: Permill = Permill::from_parts(3_000);

  /// Minimum deposit value accepted by the vault (10 USD).
  pub const MIN_DEPOSIT_USD: Balance = 10 * PRECISION;

  /// Hard cap on the execution fee a user may escrow with an intent.
  ///
  /// Prevents griefing the executor role with oversized fee deposits.
  pub const MAX_EXECUTION_FEE: Balance = PRECISION;

  /// Pending-deployment accumulator threshold that triggers deployment (100 USD).
  pub const MIN_DEPLOYMENT_THRESHOLD_USD: Balance = 100 * PRECISION;

  /// Per-basket-entry dust floor below which a deployment leg is skipped (10 USD).
  pub const DEPLOYMENT_DUST_FLOOR_USD: Balance = 10 * PRECISION;

  /// Default slippage tolerance forwarded to the venue on every order (0.3%).
  pub const DEFAULT_SLIPPAGE_BPS: BasisPoints = 30;

  /// Fixed leverage multiplier for basket positions.
  ///
  /// Always 1x: position size equals deployed collateral, eliminating
  /// liquidation risk by design.
  pub const LEVERAGE_MULTIPLIER: Balance = 1;
}
