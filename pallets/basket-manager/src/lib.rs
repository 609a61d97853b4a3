//! Basket Manager Pallet
//!
//! Basket-weighted capital deployment engine for the SHIELD protocol: reserve ledger,
//! pending deposit/withdrawal queues, venue order reconciliation and rebalancing.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

pub mod weights;
pub use weights::WeightInfo;

use frame::deps::{
  sp_core::H256,
  sp_runtime::{DispatchError, DispatchResult},
};

/// Interface to the external perpetuals venue.
///
/// Order issuance is always asynchronous: both `open_position` and `close_position`
/// return an opaque order key immediately and the actual position mutation is
/// reported later through [`OrderCallbackHandler`]. Every call escrows one venue
/// execution fee from `payer`.
pub trait PositionVenue<AccountId> {
  /// Submit an increase order. `collateral_amount` is in the collateral asset's
  /// natural units; `size_usd` is 18-decimal USD.
  fn open_position(
    payer: &AccountId,
    market: H256,
    collateral_asset: u32,
    collateral_amount: u128,
    size_usd: u128,
    is_long: bool,
    slippage_bps: u32,
  ) -> Result<H256, DispatchError>;

  /// Submit a decrease order against an existing position, sized in 18-decimal USD.
  fn close_position(
    payer: &AccountId,
    position_key: H256,
    size_usd: u128,
    slippage_bps: u32,
  ) -> Result<H256, DispatchError>;

  /// Last reported value of a confirmed position, in 18-decimal USD.
  fn position_value(position_key: H256) -> Result<u128, DispatchError>;

  /// Current venue execution fee per order, in native units.
  fn execution_fee() -> u128;
}

/// Callback endpoint the venue adapter resolves orders into.
///
/// Delivery contract: at most once per order key; duplicate delivery must be
/// rejected with an error and no side effects. `collateral_delta` is in the order's
/// collateral-asset units (it matches the tokens actually returned on a decrease);
/// `executed_size_usd` and `realized_pnl_usd` are 18-decimal USD.
pub trait OrderCallbackHandler {
  fn on_order_executed(
    order_key: H256,
    position_key: H256,
    is_increase: bool,
    executed_size_usd: u128,
    collateral_delta: u128,
    realized_pnl_usd: i128,
  ) -> DispatchResult;

  fn on_order_failed(order_key: H256) -> DispatchResult;
}

impl OrderCallbackHandler for () {
  fn on_order_executed(
    _order_key: H256,
    _position_key: H256,
    _is_increase: bool,
    _executed_size_usd: u128,
    _collateral_delta: u128,
    _realized_pnl_usd: i128,
  ) -> DispatchResult {
    Ok(())
  }

  fn on_order_failed(_order_key: H256) -> DispatchResult {
    Ok(())
  }
}

#[frame::pallet]
pub mod pallet {
  use super::{OrderCallbackHandler, PositionVenue, WeightInfo};
  use alloc::vec::Vec;
  use frame::deps::{
    frame_support::{
      PalletId,
      traits::{
        ConstU64,
        EnsureOrigin,
        fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
        fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
        tokens::Preservation,
      },
    },
    sp_core::H256,
    sp_runtime::{
      DispatchError,
      traits::{AccountIdConversion, Saturating, Zero},
    },
  };
  use frame::prelude::*;
  use primitives::params::{BPS_DENOMINATOR, LEVERAGE_MULTIPLIER};
  use primitives::{from_usd_18, to_usd_18};

  pub const LOG_TARGET: &str = "runtime::basket-manager";

  pub type Balance = u128;
  pub type BasketIndex = u32;
  pub type DepositId = u64;
  pub type WithdrawalId = u64;

  /// Reserve ledger entry for one supported stablecoin.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct ReserveAsset {
    /// Idle collateral held by the pallet account, in asset units
    pub reserves: Balance,
    /// Target share of idle reserves kept in this asset
    pub target_weight_bps: u32,
    /// Natural decimal count of the asset
    pub decimals: u8,
    /// Inactive assets reject new deposits but keep their balances
    pub active: bool,
  }

  /// One basket line item: a target commodity exposure with at most one open position.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct CommodityAllocation<BlockNumber> {
    /// Venue market reference
    pub market: H256,
    /// Human-readable name
    pub name: BoundedVec<u8, ConstU32<32>>,
    /// Target weight in basis points; active weights sum to 10_000
    pub target_weight_bps: u32,
    /// Confirmed venue position, if any
    pub position_key: Option<H256>,
    /// Collateral asset backing the confirmed position
    pub position_asset: Option<u32>,
    /// In-flight venue order; set on submission, cleared by the callback
    pub pending_order_key: Option<H256>,
    /// Last known position value in 18-decimal USD
    pub last_value_usd: Balance,
    /// Block of the last reconciliation touching this entry
    pub last_update: BlockNumber,
    pub active: bool,
  }

  /// What a venue order was issued for.
  #[derive(
    Clone,
    Copy,
    Encode,
    Decode,
    DecodeWithMemTracking,
    Eq,
    PartialEq,
    RuntimeDebug,
    TypeInfo,
    MaxEncodedLen,
  )]
  pub enum OrderLink {
    Deposit(DepositId),
    Withdrawal(WithdrawalId),
    Rebalance,
  }

  /// Join record routing an asynchronous callback back to the basket slot and the
  /// pending queue entry that spawned the order.
  ///
  /// Consumed with `take` on delivery, which doubles as the duplicate-callback guard.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct OrderContext {
    pub basket_index: BasketIndex,
    pub link: OrderLink,
    pub collateral_asset: u32,
    /// Collateral escrowed with the order (increase legs), in asset units
    pub collateral_amount: Balance,
    /// Estimated USD effect used for raised-value accounting
    pub estimated_usd: Balance,
    pub is_increase: bool,
  }

  /// Queue entry linking a reserve-level deposit to the venue orders it spawned.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct PendingDeposit<AccountId> {
    pub funder: AccountId,
    pub asset: u32,
    pub amount: Balance,
    pub total_orders: u32,
    pub remaining_orders: u32,
    pub failed_orders: u32,
    /// Flips exactly once, after every associated order has resolved
    pub is_processed: bool,
  }

  /// Queue entry for a withdrawal that required liquidating positions.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct PendingWithdrawal<AccountId> {
    pub recipient: AccountId,
    pub asset: u32,
    /// Amount owed to the recipient, in asset units
    pub requested_amount: Balance,
    /// Cumulative over-close estimate submitted to the venue, in 18-decimal USD
    pub estimated_raise_usd: Balance,
    pub total_orders: u32,
    pub remaining_orders: u32,
    pub failed_orders: u32,
    pub is_processed: bool,
    /// Unpaid remainder when reserves could not cover the request at settlement
    pub shortfall: Balance,
  }

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for reserve stablecoins
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = u128>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = u128>;

    /// Native currency, used for venue execution fees
    type Currency: NativeInspect<Self::AccountId, Balance = u128>
      + NativeMutate<Self::AccountId, Balance = u128>;

    /// Asynchronous order execution service wrapping the perpetuals venue
    type Venue: PositionVenue<Self::AccountId>;

    /// Origin that can manage reserve assets, basket entries and weights
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Origin allowed to trigger rebalancing
    type KeeperOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Pallet ID for the reserve custody account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Pending-deployment accumulator threshold that triggers deployment (USD)
    #[pallet::constant]
    type MinDeploymentThresholdUsd: Get<Balance>;

    /// Per-entry dust floor below which a deployment leg is skipped (USD)
    #[pallet::constant]
    type DeploymentDustFloorUsd: Get<Balance>;

    /// Fraction of total managed value kept uninvested for instant redemptions
    #[pallet::constant]
    type EmergencyBufferBps: Get<u32>;

    /// Buffer added to the close percentage on partial liquidations
    #[pallet::constant]
    type OverCloseBufferBps: Get<u32>;

    /// Weight drift tolerated before a rebalance leg is issued
    #[pallet::constant]
    type RebalanceToleranceBps: Get<u32>;

    /// Slippage tolerance forwarded to the venue on every order
    #[pallet::constant]
    type DefaultSlippageBps: Get<u32>;

    /// Lower bound for the admin-settable rebalance cooldown
    #[pallet::constant]
    type MinRebalanceCooldown: Get<BlockNumberFor<Self>>;

    /// Upper bound for the admin-settable rebalance cooldown
    #[pallet::constant]
    type MaxRebalanceCooldown: Get<BlockNumberFor<Self>>;

    /// Maximum number of basket entries
    #[pallet::constant]
    type MaxBasketEntries: Get<u32>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Reserve ledger, one entry per supported stablecoin
  #[pallet::storage]
  #[pallet::getter(fn reserve_asset)]
  pub type ReserveAssets<T: Config> =
    StorageMap<_, Blake2_128Concat, u32, ReserveAsset, OptionQuery>;

  /// Dense basket array; indices are stable for the lifetime of an entry
  #[pallet::storage]
  #[pallet::getter(fn basket_entry)]
  pub type Baskets<T: Config> =
    StorageMap<_, Blake2_128Concat, BasketIndex, CommodityAllocation<BlockNumberFor<T>>, OptionQuery>;

  /// Number of basket entries ever added; next insertion index
  #[pallet::storage]
  pub type BasketCount<T: Config> = StorageValue<_, BasketIndex, ValueQuery>;

  /// Deposited capital awaiting deployment, per asset
  #[pallet::storage]
  pub type PendingDeployment<T: Config> = StorageMap<_, Blake2_128Concat, u32, Balance, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn pending_deposit)]
  pub type PendingDeposits<T: Config> =
    StorageMap<_, Blake2_128Concat, DepositId, PendingDeposit<T::AccountId>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn pending_withdrawal)]
  pub type PendingWithdrawals<T: Config> =
    StorageMap<_, Blake2_128Concat, WithdrawalId, PendingWithdrawal<T::AccountId>, OptionQuery>;

  /// Next deposit id; ids start at 1 so 0 can serve as an external null reference
  #[pallet::storage]
  pub type NextDepositId<T: Config> = StorageValue<_, DepositId, ValueQuery, ConstU64<1>>;

  /// Next withdrawal id; ids start at 1
  #[pallet::storage]
  pub type NextWithdrawalId<T: Config> = StorageValue<_, WithdrawalId, ValueQuery, ConstU64<1>>;

  /// Order-key join index; the single source of truth for callback routing
  #[pallet::storage]
  #[pallet::getter(fn order_context)]
  pub type OrderIndex<T: Config> = StorageMap<_, Blake2_128Concat, H256, OrderContext, OptionQuery>;

  /// Realized profit accumulated from decrease settlements, in 18-decimal USD.
  ///
  /// Losses are never subtracted here; they already reduce managed value through
  /// the position's own valuation.
  #[pallet::storage]
  #[pallet::getter(fn realized_yield)]
  pub type RealizedYield<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Mutual-exclusion flag; set while rebalance orders are unresolved
  #[pallet::storage]
  #[pallet::getter(fn rebalance_in_progress)]
  pub type RebalanceInProgress<T: Config> = StorageValue<_, bool, ValueQuery>;

  /// Unresolved rebalance orders; the in-progress flag clears when this hits zero
  #[pallet::storage]
  pub type RebalanceOrdersOutstanding<T: Config> = StorageValue<_, u32, ValueQuery>;

  #[pallet::storage]
  pub type LastRebalanceAt<T: Config> = StorageValue<_, BlockNumberFor<T>, ValueQuery>;

  /// Admin-settable cooldown between rebalances, clamped to the configured bounds.
  /// Zero means "not set"; the minimum bound applies.
  #[pallet::storage]
  pub type RebalanceCooldown<T: Config> = StorageValue<_, BlockNumberFor<T>, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A stablecoin was added to the reserve ledger
    ReserveAssetAdded {
      asset: u32,
      decimals: u8,
      target_weight_bps: u32,
    },
    ReserveAssetStatusChanged {
      asset: u32,
      active: bool,
    },
    BasketEntryAdded {
      index: BasketIndex,
      market: H256,
      name: Vec<u8>,
    },
    BasketWeightUpdated {
      index: BasketIndex,
      old_weight_bps: u32,
      new_weight_bps: u32,
    },
    BasketEntryStatusChanged {
      index: BasketIndex,
      active: bool,
    },
    /// Reserve capital credited; a pending deposit record was created
    ReservesDeposited {
      deposit_id: DepositId,
      asset: u32,
      amount: Balance,
    },
    /// One deployment leg was submitted to the venue
    DeploymentOrderSubmitted {
      deposit_id: DepositId,
      basket_index: BasketIndex,
      order_key: H256,
      collateral_amount: Balance,
      size_usd: Balance,
    },
    /// One deployment leg failed at submission; its share stays in the accumulator
    DeploymentLegFailed {
      basket_index: BasketIndex,
      asset: u32,
      amount: Balance,
      error: DispatchError,
    },
    /// Every order spawned by the deposit has resolved
    DepositProcessed {
      deposit_id: DepositId,
      success: bool,
    },
    /// Withdrawal paid instantly from idle reserves
    ReservesWithdrawn {
      asset: u32,
      amount: Balance,
      to: T::AccountId,
    },
    /// Withdrawal exceeded idle reserves; liquidation orders were queued
    WithdrawalQueued {
      withdrawal_id: WithdrawalId,
      asset: u32,
      requested_amount: Balance,
      estimated_raise_usd: Balance,
    },
    LiquidationOrderSubmitted {
      withdrawal_id: WithdrawalId,
      basket_index: BasketIndex,
      order_key: H256,
      size_usd: Balance,
      close_bps: u32,
    },
    LiquidationLegFailed {
      basket_index: BasketIndex,
      error: DispatchError,
    },
    /// Every order spawned by the withdrawal has resolved and payout settled
    WithdrawalProcessed {
      withdrawal_id: WithdrawalId,
      paid: Balance,
      shortfall: Balance,
      success: bool,
    },
    /// An executed order was reconciled against its basket slot
    OrderReconciled {
      order_key: H256,
      basket_index: BasketIndex,
      is_increase: bool,
    },
    /// A failed order was reconciled; no position change
    OrderFailed {
      order_key: H256,
      basket_index: BasketIndex,
    },
    /// Realized profit credited from a decrease settlement
    YieldRealized {
      amount_usd: Balance,
    },
    RebalanceTriggered {
      orders_submitted: u32,
    },
    RebalanceLegSubmitted {
      basket_index: BasketIndex,
      order_key: H256,
      is_increase: bool,
      size_usd: Balance,
    },
    RebalanceLegFailed {
      basket_index: BasketIndex,
      error: DispatchError,
    },
    /// The last outstanding rebalance order resolved
    RebalanceSettled,
    RebalanceCooldownSet {
      blocks: BlockNumberFor<T>,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Asset already present in the reserve ledger
    AssetAlreadyRegistered,
    /// Asset not present in the reserve ledger
    UnknownReserveAsset,
    /// Asset is registered but inactive
    AssetInactive,
    /// Decimal count outside the supported range
    InvalidDecimals,
    /// Basket is at capacity
    BasketFull,
    /// No basket entry at this index
    UnknownBasketEntry,
    /// Active basket weights must sum to exactly 10_000 bps
    InvalidWeightSum,
    /// Entries must carry zero weight before deactivation
    EntryHasWeight,
    /// Zero amount not allowed
    ZeroAmount,
    /// Idle reserves and liquidatable positions cannot cover the request
    InsufficientReserves,
    /// A rebalance is already awaiting venue settlement
    RebalanceAlreadyInProgress,
    /// Rebalance cooldown has not elapsed
    RebalanceCooldownActive,
    /// Requested cooldown outside the configured bounds
    CooldownOutOfBounds,
    /// Nothing is managed yet; rebalance is meaningless
    NoManagedValue,
    /// Order key is not indexed (unknown, or already reconciled)
    UnknownOrder,
    /// No pending deposit with this id
    UnknownDeposit,
    /// No pending withdrawal with this id
    UnknownWithdrawal,
    /// Arithmetic overflow occurred
    ArithmeticOverflow,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Register a stablecoin in the reserve ledger.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::add_reserve_asset())]
    pub fn add_reserve_asset(
      origin: OriginFor<T>,
      asset: u32,
      decimals: u8,
      target_weight_bps: u32,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      ensure!(
        !ReserveAssets::<T>::contains_key(asset),
        Error::<T>::AssetAlreadyRegistered
      );
      ensure!(
        decimals as u32 <= primitives::MAX_ASSET_DECIMALS as u32,
        Error::<T>::InvalidDecimals
      );
      ensure!(
        target_weight_bps as u128 <= BPS_DENOMINATOR,
        Error::<T>::InvalidWeightSum
      );

      ReserveAssets::<T>::insert(
        asset,
        ReserveAsset {
          reserves: 0,
          target_weight_bps,
          decimals,
          active: true,
        },
      );

      Self::deposit_event(Event::ReserveAssetAdded {
        asset,
        decimals,
        target_weight_bps,
      });

      Ok(())
    }

    /// Activate or deactivate a reserve asset. Balances remain untouched.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_reserve_asset_active())]
    pub fn set_reserve_asset_active(
      origin: OriginFor<T>,
      asset: u32,
      active: bool,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      ReserveAssets::<T>::try_mutate(asset, |maybe| {
        let cfg = maybe.as_mut().ok_or(Error::<T>::UnknownReserveAsset)?;
        cfg.active = active;
        Ok::<(), DispatchError>(())
      })?;

      Self::deposit_event(Event::ReserveAssetStatusChanged { asset, active });

      Ok(())
    }

    /// Add a basket entry for a venue market. Entries start active at zero weight;
    /// weights are assigned atomically through `set_target_weights`.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::add_basket_entry())]
    pub fn add_basket_entry(
      origin: OriginFor<T>,
      market: H256,
      name: BoundedVec<u8, ConstU32<32>>,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      let index = BasketCount::<T>::get();
      ensure!(index < T::MaxBasketEntries::get(), Error::<T>::BasketFull);

      Baskets::<T>::insert(
        index,
        CommodityAllocation {
          market,
          name: name.clone(),
          target_weight_bps: 0,
          position_key: None,
          position_asset: None,
          pending_order_key: None,
          last_value_usd: 0,
          last_update: frame_system::Pallet::<T>::block_number(),
          active: true,
        },
      );
      BasketCount::<T>::put(index.saturating_add(1));

      Self::deposit_event(Event::BasketEntryAdded {
        index,
        market,
        name: name.into_inner(),
      });

      Ok(())
    }

    /// Update target weights atomically. The resulting active weights must sum to
    /// exactly 10_000 bps or the whole call fails without mutating state.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::set_target_weights())]
    pub fn set_target_weights(
      origin: OriginFor<T>,
      updates: BoundedVec<(BasketIndex, u32), T::MaxBasketEntries>,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      let mut entries: Vec<(BasketIndex, CommodityAllocation<BlockNumberFor<T>>)> =
        Baskets::<T>::iter().collect();
      entries.sort_by_key(|(index, _)| *index);

      let mut applied: Vec<(BasketIndex, u32, u32)> = Vec::new();
      for (index, new_weight) in updates.iter() {
        ensure!(
          *new_weight as u128 <= BPS_DENOMINATOR,
          Error::<T>::InvalidWeightSum
        );
        let entry = entries
          .iter_mut()
          .find(|(i, _)| i == index)
          .map(|(_, e)| e)
          .ok_or(Error::<T>::UnknownBasketEntry)?;
        applied.push((*index, entry.target_weight_bps, *new_weight));
        entry.target_weight_bps = *new_weight;
      }

      let sum: u128 = entries
        .iter()
        .filter(|(_, e)| e.active)
        .map(|(_, e)| e.target_weight_bps as u128)
        .sum();
      ensure!(sum == BPS_DENOMINATOR, Error::<T>::InvalidWeightSum);

      for (index, entry) in entries {
        Baskets::<T>::insert(index, entry);
      }
      for (index, old_weight_bps, new_weight_bps) in applied {
        Self::deposit_event(Event::BasketWeightUpdated {
          index,
          old_weight_bps,
          new_weight_bps,
        });
      }

      Ok(())
    }

    /// Activate or deactivate a basket entry. Deactivation requires zero weight so
    /// the active-weight invariant cannot silently break; an open position keeps
    /// counting toward managed value until closed by rebalancing.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::set_basket_entry_active())]
    pub fn set_basket_entry_active(
      origin: OriginFor<T>,
      index: BasketIndex,
      active: bool,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      Baskets::<T>::try_mutate(index, |maybe| {
        let entry = maybe.as_mut().ok_or(Error::<T>::UnknownBasketEntry)?;
        if !active {
          ensure!(entry.target_weight_bps == 0, Error::<T>::EntryHasWeight);
        }
        entry.active = active;
        Ok::<(), DispatchError>(())
      })?;

      Self::deposit_event(Event::BasketEntryStatusChanged { index, active });

      Ok(())
    }

    /// Set the rebalance cooldown, clamped to the configured min/max bounds.
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::set_rebalance_cooldown())]
    pub fn set_rebalance_cooldown(
      origin: OriginFor<T>,
      blocks: BlockNumberFor<T>,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      ensure!(
        blocks >= T::MinRebalanceCooldown::get() && blocks <= T::MaxRebalanceCooldown::get(),
        Error::<T>::CooldownOutOfBounds
      );
      RebalanceCooldown::<T>::put(blocks);

      Self::deposit_event(Event::RebalanceCooldownSet { blocks });

      Ok(())
    }

    /// Compare actual and target weights and issue increase/decrease orders for
    /// entries drifting outside the tolerance band.
    ///
    /// Fails fast while a prior rebalance is unresolved: overlapping rebalances
    /// could double-adjust positions.
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::rebalance_positions())]
    pub fn rebalance_positions(origin: OriginFor<T>) -> DispatchResult {
      T::KeeperOrigin::ensure_origin(origin)?;

      ensure!(
        !RebalanceInProgress::<T>::get(),
        Error::<T>::RebalanceAlreadyInProgress
      );

      let now = frame_system::Pallet::<T>::block_number();
      let mut cooldown = RebalanceCooldown::<T>::get();
      if cooldown.is_zero() {
        cooldown = T::MinRebalanceCooldown::get();
      }
      ensure!(
        now >= LastRebalanceAt::<T>::get().saturating_add(cooldown),
        Error::<T>::RebalanceCooldownActive
      );

      let total = Self::total_managed_value();
      ensure!(total > 0, Error::<T>::NoManagedValue);

      let mut entries: Vec<(BasketIndex, CommodityAllocation<BlockNumberFor<T>>)> =
        Baskets::<T>::iter().filter(|(_, e)| e.active).collect();
      entries.sort_by_key(|(index, _)| *index);

      let tolerance = T::RebalanceToleranceBps::get() as u128;
      let mut submitted = 0u32;

      for (index, entry) in entries {
        if entry.pending_order_key.is_some() {
          continue;
        }

        let value = entry
          .position_key
          .map(|key| T::Venue::position_value(key).unwrap_or(entry.last_value_usd))
          .unwrap_or(0);
        let actual_bps = value.saturating_mul(BPS_DENOMINATOR) / total;
        let target_bps = entry.target_weight_bps as u128;
        if actual_bps.abs_diff(target_bps) <= tolerance {
          continue;
        }

        let delta_usd = actual_bps.abs_diff(target_bps).saturating_mul(total) / BPS_DENOMINATOR;
        if actual_bps < target_bps {
          if Self::submit_rebalance_increase(index, &entry, delta_usd) {
            submitted = submitted.saturating_add(1);
          }
        } else if let Some(position_key) = entry.position_key {
          if Self::submit_rebalance_decrease(index, &entry, position_key, delta_usd) {
            submitted = submitted.saturating_add(1);
          }
        }
      }

      if submitted > 0 {
        RebalanceInProgress::<T>::put(true);
        RebalanceOrdersOutstanding::<T>::put(submitted);
        LastRebalanceAt::<T>::put(now);
      }

      Self::deposit_event(Event::RebalanceTriggered {
        orders_submitted: submitted,
      });

      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (reserve custody)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// True when at least one active basket entry carries a nonzero target weight.
    pub fn has_deployment_target() -> bool {
      Baskets::<T>::iter().any(|(_, e)| e.active && e.target_weight_bps > 0)
    }

    pub fn is_reserve_asset(asset: u32) -> bool {
      ReserveAssets::<T>::get(asset).map(|c| c.active).unwrap_or(false)
    }

    pub fn reserve_decimals(asset: u32) -> Option<u8> {
      ReserveAssets::<T>::get(asset).map(|c| c.decimals)
    }

    /// Processed flag and shortfall of a pending withdrawal, for external pollers.
    pub fn withdrawal_state(id: WithdrawalId) -> Option<(bool, Balance)> {
      PendingWithdrawals::<T>::get(id).map(|w| (w.is_processed, w.shortfall))
    }

    /// Idle reserves plus the venue-reported value of confirmed positions, in
    /// 18-decimal USD. Pending, unconfirmed orders are never counted: capital in
    /// flight must not inflate NAV before it is actually earning basket exposure.
    pub fn total_managed_value() -> Balance {
      let mut total: Balance = 0;
      for (_, entry) in Baskets::<T>::iter() {
        if let Some(key) = entry.position_key {
          let value = T::Venue::position_value(key).unwrap_or(entry.last_value_usd);
          total = total.saturating_add(value);
        }
      }
      total.saturating_add(Self::total_idle_reserves_usd())
    }

    fn total_idle_reserves_usd() -> Balance {
      ReserveAssets::<T>::iter().fold(0u128, |acc, (_, cfg)| {
        acc.saturating_add(to_usd_18(cfg.reserves, cfg.decimals).unwrap_or(0))
      })
    }

    /// Credit reserve capital from `from` and queue deployment.
    ///
    /// Invoked by the intent layer on deposit settlement, never directly by users.
    /// Returns the pending-deposit id; a deposit that spawned no orders (below
    /// threshold, dust, or all legs failed) is marked processed immediately.
    pub fn deposit_reserves(
      from: &T::AccountId,
      asset: u32,
      amount: Balance,
    ) -> Result<DepositId, DispatchError> {
      ensure!(amount > 0, Error::<T>::ZeroAmount);
      let cfg = ReserveAssets::<T>::get(asset).ok_or(Error::<T>::UnknownReserveAsset)?;
      ensure!(cfg.active, Error::<T>::AssetInactive);

      T::Assets::transfer(
        asset,
        from,
        &Self::account_id(),
        amount,
        Preservation::Expendable,
      )?;

      ReserveAssets::<T>::mutate(asset, |maybe| {
        if let Some(c) = maybe {
          c.reserves = c.reserves.saturating_add(amount);
        }
      });
      let pending = PendingDeployment::<T>::get(asset).saturating_add(amount);
      PendingDeployment::<T>::insert(asset, pending);

      let deposit_id = NextDepositId::<T>::mutate(|id| {
        let current = *id;
        *id = id.saturating_add(1);
        current
      });

      let mut record = PendingDeposit {
        funder: from.clone(),
        asset,
        amount,
        total_orders: 0,
        remaining_orders: 0,
        failed_orders: 0,
        is_processed: false,
      };

      let pending_usd = to_usd_18(pending, cfg.decimals).ok_or(Error::<T>::ArithmeticOverflow)?;
      if pending_usd >= T::MinDeploymentThresholdUsd::get() {
        Self::deploy_pending(asset, cfg.decimals, deposit_id, &mut record);
      }

      if record.total_orders == 0 {
        record.is_processed = true;
        Self::deposit_event(Event::DepositProcessed {
          deposit_id,
          success: true,
        });
      }
      PendingDeposits::<T>::insert(deposit_id, record);

      Self::deposit_event(Event::ReservesDeposited {
        deposit_id,
        asset,
        amount,
      });

      Ok(deposit_id)
    }

    /// Fan the pending accumulator out across active basket entries proportionally
    /// to target weight. Best-effort per leg: a failed venue call is recorded and
    /// leaves its share in the accumulator, it never aborts the sibling legs.
    fn deploy_pending(
      asset: u32,
      decimals: u8,
      deposit_id: DepositId,
      record: &mut PendingDeposit<T::AccountId>,
    ) {
      let pending = PendingDeployment::<T>::get(asset);
      let mut entries: Vec<(BasketIndex, CommodityAllocation<BlockNumberFor<T>>)> =
        Baskets::<T>::iter().filter(|(_, e)| e.active).collect();
      entries.sort_by_key(|(index, _)| *index);

      for (index, mut entry) in entries {
        if entry.pending_order_key.is_some() || entry.target_weight_bps == 0 {
          continue;
        }

        let share = pending.saturating_mul(entry.target_weight_bps as u128) / BPS_DENOMINATOR;
        let share_usd = match to_usd_18(share, decimals) {
          Some(v) => v,
          None => continue,
        };
        if share_usd < T::DeploymentDustFloorUsd::get() {
          continue;
        }
        let size_usd = share_usd.saturating_mul(LEVERAGE_MULTIPLIER);

        match T::Venue::open_position(
          &Self::account_id(),
          entry.market,
          asset,
          share,
          size_usd,
          true,
          T::DefaultSlippageBps::get(),
        ) {
          Ok(order_key) => {
            entry.pending_order_key = Some(order_key);
            Baskets::<T>::insert(index, entry);
            OrderIndex::<T>::insert(
              order_key,
              OrderContext {
                basket_index: index,
                link: OrderLink::Deposit(deposit_id),
                collateral_asset: asset,
                collateral_amount: share,
                estimated_usd: share_usd,
                is_increase: true,
              },
            );
            ReserveAssets::<T>::mutate(asset, |maybe| {
              if let Some(c) = maybe {
                c.reserves = c.reserves.saturating_sub(share);
              }
            });
            PendingDeployment::<T>::mutate(asset, |p| *p = p.saturating_sub(share));
            record.total_orders = record.total_orders.saturating_add(1);
            record.remaining_orders = record.remaining_orders.saturating_add(1);
            Self::deposit_event(Event::DeploymentOrderSubmitted {
              deposit_id,
              basket_index: index,
              order_key,
              collateral_amount: share,
              size_usd,
            });
          }
          Err(error) => {
            log::warn!(
              target: LOG_TARGET,
              "deployment leg failed for basket {index}: {error:?}"
            );
            Self::deposit_event(Event::DeploymentLegFailed {
              basket_index: index,
              asset,
              amount: share,
              error,
            });
          }
        }
      }
    }

    /// Pay out reserve capital, liquidating positions when idle reserves cannot
    /// cover the request without breaching the emergency buffer.
    ///
    /// Returns `None` when paid instantly, or the pending-withdrawal id when
    /// liquidation orders were queued; settlement then pays the recipient once
    /// every order resolves.
    pub fn withdraw_reserves(
      asset: u32,
      amount: Balance,
      to: &T::AccountId,
    ) -> Result<Option<WithdrawalId>, DispatchError> {
      ensure!(amount > 0, Error::<T>::ZeroAmount);
      let cfg = ReserveAssets::<T>::get(asset).ok_or(Error::<T>::UnknownReserveAsset)?;

      let amount_usd = to_usd_18(amount, cfg.decimals).ok_or(Error::<T>::ArithmeticOverflow)?;
      // the floor binds on what remains under management after the payout, so
      // fully-idle capital can always leave the way it came in
      let buffer_floor = Self::total_managed_value()
        .saturating_sub(amount_usd)
        .saturating_mul(T::EmergencyBufferBps::get() as u128)
        / BPS_DENOMINATOR;
      let idle_usd = Self::total_idle_reserves_usd();

      if cfg.reserves >= amount && idle_usd.saturating_sub(amount_usd) >= buffer_floor {
        T::Assets::transfer(asset, &Self::account_id(), to, amount, Preservation::Expendable)?;
        ReserveAssets::<T>::mutate(asset, |maybe| {
          if let Some(c) = maybe {
            c.reserves = c.reserves.saturating_sub(amount);
          }
        });
        Self::clamp_pending_to_reserves(asset);
        Self::deposit_event(Event::ReservesWithdrawn {
          asset,
          amount,
          to: to.clone(),
        });
        return Ok(None);
      }

      let withdrawal_id = NextWithdrawalId::<T>::get();
      let covered_usd = to_usd_18(cfg.reserves.min(amount), cfg.decimals).unwrap_or(0);
      let need_usd = amount_usd.saturating_sub(covered_usd);

      let mut record = PendingWithdrawal {
        recipient: to.clone(),
        asset,
        requested_amount: amount,
        estimated_raise_usd: 0,
        total_orders: 0,
        remaining_orders: 0,
        failed_orders: 0,
        is_processed: false,
        shortfall: 0,
      };
      Self::liquidate_for(withdrawal_id, need_usd, &mut record);

      ensure!(record.total_orders > 0, Error::<T>::InsufficientReserves);

      NextWithdrawalId::<T>::put(withdrawal_id.saturating_add(1));
      Self::deposit_event(Event::WithdrawalQueued {
        withdrawal_id,
        asset,
        requested_amount: amount,
        estimated_raise_usd: record.estimated_raise_usd,
      });
      PendingWithdrawals::<T>::insert(withdrawal_id, record);

      Ok(Some(withdrawal_id))
    }

    /// Undeployed capital cannot exceed what is actually on hand; reserves spent
    /// outside the deployment path shrink the accumulator with them.
    fn clamp_pending_to_reserves(asset: u32) {
      let reserves = ReserveAssets::<T>::get(asset)
        .map(|c| c.reserves)
        .unwrap_or(0);
      PendingDeployment::<T>::mutate(asset, |p| {
        if *p > reserves {
          *p = reserves;
        }
      });
    }

    /// Proportional liquidation: close a fraction of each open position until the
    /// cumulative estimated raise covers the need. The over-close buffer is applied
    /// to the close percentage (clamped at 100%) to absorb price movement and fees
    /// between request and execution.
    fn liquidate_for(
      withdrawal_id: WithdrawalId,
      need_usd: Balance,
      record: &mut PendingWithdrawal<T::AccountId>,
    ) {
      let mut entries: Vec<(BasketIndex, CommodityAllocation<BlockNumberFor<T>>)> =
        Baskets::<T>::iter().collect();
      entries.sort_by_key(|(index, _)| *index);

      let buffer = T::OverCloseBufferBps::get() as u128;
      let mut raised: Balance = 0;

      for (index, mut entry) in entries {
        if raised >= need_usd {
          break;
        }
        let position_key = match entry.position_key {
          Some(key) if entry.pending_order_key.is_none() => key,
          _ => continue,
        };

        let value = match T::Venue::position_value(position_key) {
          Ok(v) if v > 0 => v,
          Ok(_) => continue,
          Err(error) => {
            log::warn!(
              target: LOG_TARGET,
              "liquidation leg skipped for basket {index}: {error:?}"
            );
            Self::deposit_event(Event::LiquidationLegFailed {
              basket_index: index,
              error,
            });
            continue;
          }
        };

        let remaining = need_usd.saturating_sub(raised);
        // ceil so a tiny remainder still closes at least 1 bps
        let mut close_bps = remaining
          .saturating_mul(BPS_DENOMINATOR)
          .saturating_add(value.saturating_sub(1))
          / value;
        close_bps =
          close_bps.saturating_mul(BPS_DENOMINATOR.saturating_add(buffer)) / BPS_DENOMINATOR;
        close_bps = close_bps.min(BPS_DENOMINATOR);

        let size_usd = value.saturating_mul(close_bps) / BPS_DENOMINATOR;
        if size_usd == 0 {
          continue;
        }

        match T::Venue::close_position(
          &Self::account_id(),
          position_key,
          size_usd,
          T::DefaultSlippageBps::get(),
        ) {
          Ok(order_key) => {
            entry.pending_order_key = Some(order_key);
            let collateral_asset = entry.position_asset.unwrap_or(record.asset);
            Baskets::<T>::insert(index, entry);
            OrderIndex::<T>::insert(
              order_key,
              OrderContext {
                basket_index: index,
                link: OrderLink::Withdrawal(withdrawal_id),
                collateral_asset,
                collateral_amount: 0,
                estimated_usd: size_usd,
                is_increase: false,
              },
            );
            raised = raised.saturating_add(size_usd);
            record.estimated_raise_usd = record.estimated_raise_usd.saturating_add(size_usd);
            record.total_orders = record.total_orders.saturating_add(1);
            record.remaining_orders = record.remaining_orders.saturating_add(1);
            Self::deposit_event(Event::LiquidationOrderSubmitted {
              withdrawal_id,
              basket_index: index,
              order_key,
              size_usd,
              close_bps: close_bps as u32,
            });
          }
          Err(error) => {
            log::warn!(
              target: LOG_TARGET,
              "liquidation leg failed for basket {index}: {error:?}"
            );
            Self::deposit_event(Event::LiquidationLegFailed {
              basket_index: index,
              error,
            });
          }
        }
      }
    }

    fn submit_rebalance_increase(
      index: BasketIndex,
      entry: &CommodityAllocation<BlockNumberFor<T>>,
      delta_usd: Balance,
    ) -> bool {
      // fund the deficit from the deepest active reserve asset
      let funding = ReserveAssets::<T>::iter()
        .filter(|(_, c)| c.active && c.reserves > 0)
        .max_by_key(|(_, c)| to_usd_18(c.reserves, c.decimals).unwrap_or(0));
      let (asset, cfg) = match funding {
        Some(found) => found,
        None => return false,
      };

      let available_usd = to_usd_18(cfg.reserves, cfg.decimals).unwrap_or(0);
      let spend_usd = delta_usd.min(available_usd);
      if spend_usd < T::DeploymentDustFloorUsd::get() {
        return false;
      }
      let collateral = match from_usd_18(spend_usd, cfg.decimals) {
        Some(v) if v > 0 => v,
        _ => return false,
      };

      match T::Venue::open_position(
        &Self::account_id(),
        entry.market,
        asset,
        collateral,
        spend_usd.saturating_mul(LEVERAGE_MULTIPLIER),
        true,
        T::DefaultSlippageBps::get(),
      ) {
        Ok(order_key) => {
          Baskets::<T>::mutate(index, |maybe| {
            if let Some(e) = maybe {
              e.pending_order_key = Some(order_key);
            }
          });
          ReserveAssets::<T>::mutate(asset, |maybe| {
            if let Some(c) = maybe {
              c.reserves = c.reserves.saturating_sub(collateral);
            }
          });
          Self::clamp_pending_to_reserves(asset);
          OrderIndex::<T>::insert(
            order_key,
            OrderContext {
              basket_index: index,
              link: OrderLink::Rebalance,
              collateral_asset: asset,
              collateral_amount: collateral,
              estimated_usd: spend_usd,
              is_increase: true,
            },
          );
          Self::deposit_event(Event::RebalanceLegSubmitted {
            basket_index: index,
            order_key,
            is_increase: true,
            size_usd: spend_usd,
          });
          true
        }
        Err(error) => {
          log::warn!(
            target: LOG_TARGET,
            "rebalance increase failed for basket {index}: {error:?}"
          );
          Self::deposit_event(Event::RebalanceLegFailed {
            basket_index: index,
            error,
          });
          false
        }
      }
    }

    fn submit_rebalance_decrease(
      index: BasketIndex,
      entry: &CommodityAllocation<BlockNumberFor<T>>,
      position_key: H256,
      delta_usd: Balance,
    ) -> bool {
      match T::Venue::close_position(
        &Self::account_id(),
        position_key,
        delta_usd,
        T::DefaultSlippageBps::get(),
      ) {
        Ok(order_key) => {
          Baskets::<T>::mutate(index, |maybe| {
            if let Some(e) = maybe {
              e.pending_order_key = Some(order_key);
            }
          });
          OrderIndex::<T>::insert(
            order_key,
            OrderContext {
              basket_index: index,
              link: OrderLink::Rebalance,
              collateral_asset: entry.position_asset.unwrap_or_default(),
              collateral_amount: 0,
              estimated_usd: delta_usd,
              is_increase: false,
            },
          );
          Self::deposit_event(Event::RebalanceLegSubmitted {
            basket_index: index,
            order_key,
            is_increase: false,
            size_usd: delta_usd,
          });
          true
        }
        Err(error) => {
          log::warn!(
            target: LOG_TARGET,
            "rebalance decrease failed for basket {index}: {error:?}"
          );
          Self::deposit_event(Event::RebalanceLegFailed {
            basket_index: index,
            error,
          });
          false
        }
      }
    }

    /// Order-independent sibling-completion check for deposits.
    fn settle_deposit_leg(deposit_id: DepositId, failed: bool) -> DispatchResult {
      PendingDeposits::<T>::try_mutate(deposit_id, |maybe| {
        let deposit = maybe.as_mut().ok_or(Error::<T>::UnknownDeposit)?;
        deposit.remaining_orders = deposit.remaining_orders.saturating_sub(1);
        if failed {
          deposit.failed_orders = deposit.failed_orders.saturating_add(1);
        }
        if deposit.remaining_orders == 0 && !deposit.is_processed {
          deposit.is_processed = true;
          Self::deposit_event(Event::DepositProcessed {
            deposit_id,
            success: deposit.failed_orders == 0,
          });
        }
        Ok(())
      })
    }

    /// Sibling-completion check for withdrawals; pays the recipient exactly the
    /// requested amount when reserves suffice, otherwise records the shortfall
    /// observably instead of hiding the gap.
    fn settle_withdrawal_leg(withdrawal_id: WithdrawalId, failed: bool) -> DispatchResult {
      PendingWithdrawals::<T>::try_mutate(withdrawal_id, |maybe| {
        let withdrawal = maybe.as_mut().ok_or(Error::<T>::UnknownWithdrawal)?;
        withdrawal.remaining_orders = withdrawal.remaining_orders.saturating_sub(1);
        if failed {
          withdrawal.failed_orders = withdrawal.failed_orders.saturating_add(1);
        }
        if withdrawal.remaining_orders > 0 || withdrawal.is_processed {
          return Ok(());
        }

        let cfg =
          ReserveAssets::<T>::get(withdrawal.asset).ok_or(Error::<T>::UnknownReserveAsset)?;
        let paid = withdrawal.requested_amount.min(cfg.reserves);
        if paid > 0 {
          T::Assets::transfer(
            withdrawal.asset,
            &Self::account_id(),
            &withdrawal.recipient,
            paid,
            Preservation::Expendable,
          )?;
          ReserveAssets::<T>::mutate(withdrawal.asset, |maybe_cfg| {
            if let Some(c) = maybe_cfg {
              c.reserves = c.reserves.saturating_sub(paid);
            }
          });
        }
        withdrawal.shortfall = withdrawal.requested_amount.saturating_sub(paid);
        withdrawal.is_processed = true;
        Self::deposit_event(Event::WithdrawalProcessed {
          withdrawal_id,
          paid,
          shortfall: withdrawal.shortfall,
          success: withdrawal.shortfall == 0,
        });
        Ok(())
      })
    }

    fn settle_rebalance_leg() {
      let outstanding = RebalanceOrdersOutstanding::<T>::get().saturating_sub(1);
      RebalanceOrdersOutstanding::<T>::put(outstanding);
      if outstanding == 0 {
        RebalanceInProgress::<T>::put(false);
        Self::deposit_event(Event::RebalanceSettled);
      }
    }
  }

  impl<T: Config> OrderCallbackHandler for Pallet<T> {
    fn on_order_executed(
      order_key: H256,
      position_key: H256,
      is_increase: bool,
      _executed_size_usd: u128,
      collateral_delta: u128,
      realized_pnl_usd: i128,
    ) -> DispatchResult {
      let ctx = OrderIndex::<T>::take(order_key).ok_or(Error::<T>::UnknownOrder)?;
      let now = frame_system::Pallet::<T>::block_number();

      Baskets::<T>::try_mutate(ctx.basket_index, |maybe| {
        let entry = maybe.as_mut().ok_or(Error::<T>::UnknownBasketEntry)?;
        entry.pending_order_key = None;
        let current_value = T::Venue::position_value(position_key).unwrap_or(0);
        if is_increase {
          entry.position_key = Some(position_key);
          entry.position_asset = Some(ctx.collateral_asset);
        } else if current_value == 0 {
          entry.position_key = None;
          entry.position_asset = None;
        }
        entry.last_value_usd = current_value;
        entry.last_update = now;
        Ok::<(), DispatchError>(())
      })?;

      if !is_increase {
        // realized collateral comes home; profit accrues to the yield counter,
        // losses already shrink the position's own valuation
        if collateral_delta > 0 {
          ReserveAssets::<T>::mutate(ctx.collateral_asset, |maybe| {
            if let Some(c) = maybe {
              c.reserves = c.reserves.saturating_add(collateral_delta);
            }
          });
        }
        if realized_pnl_usd > 0 {
          let gain = realized_pnl_usd as u128;
          RealizedYield::<T>::mutate(|y| *y = y.saturating_add(gain));
          Self::deposit_event(Event::YieldRealized { amount_usd: gain });
        }
      }

      match ctx.link {
        OrderLink::Deposit(id) => Self::settle_deposit_leg(id, false)?,
        OrderLink::Withdrawal(id) => Self::settle_withdrawal_leg(id, false)?,
        OrderLink::Rebalance => Self::settle_rebalance_leg(),
      }

      Self::deposit_event(Event::OrderReconciled {
        order_key,
        basket_index: ctx.basket_index,
        is_increase,
      });

      Ok(())
    }

    fn on_order_failed(order_key: H256) -> DispatchResult {
      let ctx = OrderIndex::<T>::take(order_key).ok_or(Error::<T>::UnknownOrder)?;
      let now = frame_system::Pallet::<T>::block_number();

      Baskets::<T>::try_mutate(ctx.basket_index, |maybe| {
        let entry = maybe.as_mut().ok_or(Error::<T>::UnknownBasketEntry)?;
        entry.pending_order_key = None;
        entry.last_update = now;
        Ok::<(), DispatchError>(())
      })?;

      if ctx.is_increase {
        // collateral was returned by the adapter; make it deployable again
        ReserveAssets::<T>::mutate(ctx.collateral_asset, |maybe| {
          if let Some(c) = maybe {
            c.reserves = c.reserves.saturating_add(ctx.collateral_amount);
          }
        });
        PendingDeployment::<T>::mutate(ctx.collateral_asset, |p| {
          *p = p.saturating_add(ctx.collateral_amount)
        });
      }

      match ctx.link {
        OrderLink::Deposit(id) => Self::settle_deposit_leg(id, true)?,
        OrderLink::Withdrawal(id) => Self::settle_withdrawal_leg(id, true)?,
        OrderLink::Rebalance => Self::settle_rebalance_leg(),
      }

      Self::deposit_event(Event::OrderFailed {
        order_key,
        basket_index: ctx.basket_index,
      });

      Ok(())
    }
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
