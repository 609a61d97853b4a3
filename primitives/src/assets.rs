//! Reserve asset helpers.
//!
//! Reserve stablecoins live in `pallet-assets` under `AssetId` (u32) identifiers and
//! carry their natural decimal count (6 for USDC/USDT, 18 for DAI-style assets).
//! All protocol arithmetic happens in canonical 18-decimal USD; these helpers are the
//! only place amounts cross that boundary.

use crate::ecosystem::Balance;

/// Canonical decimal count for USD-denominated fixed point values.
pub const USD_DECIMALS: u8 = 18;

/// Largest decimal count a reserve asset may declare.
///
/// Bounds the exponent in normalization so `10^n` cannot overflow `u128`.
pub const MAX_ASSET_DECIMALS: u8 = 24;

/// Normalize a source-asset amount up/down to canonical 18-decimal USD.
///
/// Stablecoins are valued at exactly one dollar; only the decimal shift differs per
/// asset. Returns `None` on overflow or an out-of-range decimal count. Downscaling
/// truncates toward zero.
pub fn to_usd_18(amount: Balance, decimals: u8) -> Option<Balance> {
  if decimals > MAX_ASSET_DECIMALS {
    return None;
  }
  if decimals <= USD_DECIMALS {
    let factor = 10u128.checked_pow((USD_DECIMALS - decimals) as u32)?;
    amount.checked_mul(factor)
  } else {
    let factor = 10u128.checked_pow((decimals - USD_DECIMALS) as u32)?;
    Some(amount / factor)
  }
}

/// Denormalize a canonical 18-decimal USD value back to source-asset units.
///
/// Truncates toward zero when the asset has fewer than 18 decimals, consistent with
/// `to_usd_18` so round trips lose at most one unit of asset precision.
pub fn from_usd_18(value: Balance, decimals: u8) -> Option<Balance> {
  if decimals > MAX_ASSET_DECIMALS {
    return None;
  }
  if decimals <= USD_DECIMALS {
    let factor = 10u128.checked_pow((USD_DECIMALS - decimals) as u32)?;
    Some(value / factor)
  } else {
    let factor = 10u128.checked_pow((decimals - USD_DECIMALS) as u32)?;
    value.checked_mul(factor)
  }
}

/// Basis-point ratio `|a - b| * 10_000 / b`, saturating on overflow.
///
/// Used for NAV deviation and weight drift checks. Returns `u32::MAX` when the
/// reference value is zero.
pub fn deviation_bps(observed: Balance, reference: Balance) -> u32 {
  if reference == 0 {
    return u32::MAX;
  }
  let delta = observed.abs_diff(reference);
  delta
    .saturating_mul(crate::params::BPS_DENOMINATOR)
    .checked_div(reference)
    .map(|bps| bps.min(u32::MAX as u128) as u32)
    .unwrap_or(u32::MAX)
}
