//! Venue Adapter Pallet
//!
//! On-chain half of the perpetuals venue integration. Orders are escrowed here with
//! their collateral and execution fee; an off-chain keeper relays them to the venue
//! and reports the outcome back through `execute_order`/`fail_order`, which drive the
//! basket manager's callback reconciliation.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

pub mod weights;
pub use weights::WeightInfo;

#[frame::pallet]
pub mod pallet {
  use super::WeightInfo;
  use frame::deps::{
    frame_support::{
      PalletId,
      traits::{
        EnsureOrigin,
        fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
        fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
        tokens::Preservation,
      },
    },
    sp_core::H256,
    sp_runtime::{
      DispatchError,
      traits::{AccountIdConversion, BlakeTwo256, Hash},
    },
  };
  use frame::prelude::*;
  use pallet_basket_manager::{OrderCallbackHandler, PositionVenue};

  pub const LOG_TARGET: &str = "runtime::venue-adapter";

  pub type Balance = u128;

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
  pub enum OrderStatus {
    Pending,
    Executed,
    Failed,
  }

  /// An order awaiting keeper reconciliation. Collateral (increase orders) and the
  /// execution fee stay escrowed in the pallet account until the order resolves.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct VenueOrder<AccountId> {
    pub market: H256,
    pub collateral_asset: u32,
    /// Escrowed collateral in asset units; zero for decrease orders
    pub collateral_amount: Balance,
    /// Requested size delta in 18-decimal USD
    pub size_usd: Balance,
    pub is_long: bool,
    pub slippage_bps: u32,
    pub is_increase: bool,
    /// Target position for decrease orders
    pub position_key: Option<H256>,
    pub payer: AccountId,
    pub execution_fee: Balance,
    pub status: OrderStatus,
  }

  /// Custodied venue position state, updated by keeper reports.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct VenuePosition<BlockNumber> {
    pub market: H256,
    pub collateral_asset: u32,
    /// Collateral attributed to the position, in asset units
    pub collateral_amount: Balance,
    /// Open size in 18-decimal USD
    pub size_usd: Balance,
    /// Last reported mark value in 18-decimal USD
    pub value_usd: Balance,
    pub last_report: BlockNumber,
  }

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for order collateral
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = u128>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = u128>;

    /// Native currency for execution-fee escrow
    type Currency: NativeInspect<Self::AccountId, Balance = u128>
      + NativeMutate<Self::AccountId, Balance = u128>;

    /// Endpoint order resolutions are delivered to
    type CallbackHandler: OrderCallbackHandler;

    /// Origin allowed to reconcile orders and report position marks
    type KeeperOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Origin that can adjust the execution fee
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Pallet ID for the escrow account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn order)]
  pub type Orders<T: Config> =
    StorageMap<_, Blake2_128Concat, H256, VenueOrder<T::AccountId>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn position)]
  pub type Positions<T: Config> =
    StorageMap<_, Blake2_128Concat, H256, VenuePosition<BlockNumberFor<T>>, OptionQuery>;

  /// Monotone counter folded into order and position keys
  #[pallet::storage]
  pub type OrderNonce<T: Config> = StorageValue<_, u64, ValueQuery>;

  /// Venue execution fee escrowed per order, in native units
  #[pallet::storage]
  #[pallet::getter(fn execution_fee_value)]
  pub type ExecutionFee<T: Config> = StorageValue<_, Balance, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// An order was escrowed and handed to the keeper queue
    OrderSubmitted {
      order_key: H256,
      market: H256,
      size_usd: Balance,
      is_increase: bool,
    },
    /// The keeper confirmed execution and the callback was delivered
    OrderExecuted {
      order_key: H256,
      position_key: H256,
      executed_size_usd: Balance,
    },
    /// The keeper reported failure; escrow was returned to the payer
    OrderFailed {
      order_key: H256,
    },
    /// Mark-to-market report for a custodied position
    PositionValueReported {
      position_key: H256,
      value_usd: Balance,
    },
    PositionClosed {
      position_key: H256,
    },
    ExecutionFeeSet {
      fee: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Order key not found
    UnknownOrder,
    /// Order already left the pending state
    OrderAlreadyReconciled,
    /// Position key not found
    UnknownPosition,
    /// Decrease larger than the open position
    ExcessiveDecrease,
    /// Zero amount not allowed
    ZeroAmount,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Keeper confirmation of a venue execution.
    ///
    /// Increase orders upsert the custodied position (`position_key` names an
    /// existing position to grow, or `None` mints a fresh key); decrease orders
    /// shrink it and return `collateral_delta` of escrowed collateral to the
    /// payer. The callback fires after custody is consistent, so the handler
    /// observes post-settlement position values.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::execute_order())]
    pub fn execute_order(
      origin: OriginFor<T>,
      order_key: H256,
      position_key: Option<H256>,
      executed_size_usd: Balance,
      collateral_delta: Balance,
      realized_pnl_usd: i128,
    ) -> DispatchResult {
      T::KeeperOrigin::ensure_origin(origin)?;

      let mut order = Orders::<T>::get(order_key).ok_or(Error::<T>::UnknownOrder)?;
      ensure!(
        order.status == OrderStatus::Pending,
        Error::<T>::OrderAlreadyReconciled
      );

      let now = frame_system::Pallet::<T>::block_number();
      let resolved_key = if order.is_increase {
        let key = match position_key {
          Some(existing) => {
            ensure!(
              Positions::<T>::contains_key(existing),
              Error::<T>::UnknownPosition
            );
            existing
          }
          None => Self::next_key(b"shield-venue-position", order.market, &order.payer),
        };
        Positions::<T>::mutate(key, |maybe| {
          let position = maybe.get_or_insert(VenuePosition {
            market: order.market,
            collateral_asset: order.collateral_asset,
            collateral_amount: 0,
            size_usd: 0,
            value_usd: 0,
            last_report: now,
          });
          position.collateral_amount = position
            .collateral_amount
            .saturating_add(order.collateral_amount);
          position.size_usd = position.size_usd.saturating_add(executed_size_usd);
          position.value_usd = position.value_usd.saturating_add(executed_size_usd);
          position.last_report = now;
        });
        key
      } else {
        let key = order.position_key.ok_or(Error::<T>::UnknownPosition)?;
        let mut position = Positions::<T>::get(key).ok_or(Error::<T>::UnknownPosition)?;
        ensure!(
          executed_size_usd <= position.size_usd,
          Error::<T>::ExcessiveDecrease
        );
        position.size_usd = position.size_usd.saturating_sub(executed_size_usd);
        position.value_usd = position.value_usd.saturating_sub(executed_size_usd);
        position.collateral_amount = position.collateral_amount.saturating_sub(collateral_delta);
        position.last_report = now;

        if collateral_delta > 0 {
          T::Assets::transfer(
            position.collateral_asset,
            &Self::account_id(),
            &order.payer,
            collateral_delta,
            Preservation::Expendable,
          )?;
        }

        if position.size_usd == 0 {
          Positions::<T>::remove(key);
          Self::deposit_event(Event::PositionClosed { position_key: key });
        } else {
          Positions::<T>::insert(key, position);
        }
        key
      };

      order.status = OrderStatus::Executed;
      order.position_key = Some(resolved_key);
      Orders::<T>::insert(order_key, &order);

      T::CallbackHandler::on_order_executed(
        order_key,
        resolved_key,
        order.is_increase,
        executed_size_usd,
        collateral_delta,
        realized_pnl_usd,
      )?;

      Self::deposit_event(Event::OrderExecuted {
        order_key,
        position_key: resolved_key,
        executed_size_usd,
      });

      Ok(())
    }

    /// Keeper report that the venue rejected or cancelled an order. Escrowed
    /// collateral and the execution fee go back to the payer before the failure
    /// callback fires.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::fail_order())]
    pub fn fail_order(origin: OriginFor<T>, order_key: H256) -> DispatchResult {
      T::KeeperOrigin::ensure_origin(origin)?;

      let mut order = Orders::<T>::get(order_key).ok_or(Error::<T>::UnknownOrder)?;
      ensure!(
        order.status == OrderStatus::Pending,
        Error::<T>::OrderAlreadyReconciled
      );

      if order.is_increase && order.collateral_amount > 0 {
        T::Assets::transfer(
          order.collateral_asset,
          &Self::account_id(),
          &order.payer,
          order.collateral_amount,
          Preservation::Expendable,
        )?;
      }
      if order.execution_fee > 0 {
        T::Currency::transfer(
          &Self::account_id(),
          &order.payer,
          order.execution_fee,
          Preservation::Expendable,
        )?;
      }

      log::warn!(
        target: LOG_TARGET,
        "order {order_key:?} marked failed, escrow refunded to payer"
      );
      order.status = OrderStatus::Failed;
      Orders::<T>::insert(order_key, &order);

      T::CallbackHandler::on_order_failed(order_key)?;

      Self::deposit_event(Event::OrderFailed { order_key });

      Ok(())
    }

    /// Keeper mark-to-market for a custodied position.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::report_position_value())]
    pub fn report_position_value(
      origin: OriginFor<T>,
      position_key: H256,
      value_usd: Balance,
    ) -> DispatchResult {
      T::KeeperOrigin::ensure_origin(origin)?;

      Positions::<T>::try_mutate(position_key, |maybe| {
        let position = maybe.as_mut().ok_or(Error::<T>::UnknownPosition)?;
        position.value_usd = value_usd;
        position.last_report = frame_system::Pallet::<T>::block_number();
        Ok::<(), DispatchError>(())
      })?;

      Self::deposit_event(Event::PositionValueReported {
        position_key,
        value_usd,
      });

      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::set_execution_fee())]
    pub fn set_execution_fee(origin: OriginFor<T>, fee: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ExecutionFee::<T>::put(fee);
      Self::deposit_event(Event::ExecutionFeeSet { fee });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (order escrow)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    fn next_key(tag: &[u8], market: H256, payer: &T::AccountId) -> H256 {
      let nonce = OrderNonce::<T>::mutate(|n| {
        *n = n.saturating_add(1);
        *n
      });
      BlakeTwo256::hash_of(&(tag, market, payer, nonce))
    }

    fn escrow_order(
      payer: &T::AccountId,
      order: VenueOrder<T::AccountId>,
      order_key: H256,
    ) -> Result<H256, DispatchError> {
      if order.execution_fee > 0 {
        T::Currency::transfer(
          payer,
          &Self::account_id(),
          order.execution_fee,
          Preservation::Expendable,
        )?;
      }
      if order.is_increase {
        T::Assets::transfer(
          order.collateral_asset,
          payer,
          &Self::account_id(),
          order.collateral_amount,
          Preservation::Expendable,
        )?;
      }

      Self::deposit_event(Event::OrderSubmitted {
        order_key,
        market: order.market,
        size_usd: order.size_usd,
        is_increase: order.is_increase,
      });
      Orders::<T>::insert(order_key, order);

      Ok(order_key)
    }
  }

  impl<T: Config> PositionVenue<T::AccountId> for Pallet<T> {
    fn open_position(
      payer: &T::AccountId,
      market: H256,
      collateral_asset: u32,
      collateral_amount: u128,
      size_usd: u128,
      is_long: bool,
      slippage_bps: u32,
    ) -> Result<H256, DispatchError> {
      ensure!(
        collateral_amount > 0 && size_usd > 0,
        Error::<T>::ZeroAmount
      );

      let order_key = Self::next_key(b"shield-venue-order", market, payer);
      Self::escrow_order(
        payer,
        VenueOrder {
          market,
          collateral_asset,
          collateral_amount,
          size_usd,
          is_long,
          slippage_bps,
          is_increase: true,
          position_key: None,
          payer: payer.clone(),
          execution_fee: ExecutionFee::<T>::get(),
          status: OrderStatus::Pending,
        },
        order_key,
      )
    }

    fn close_position(
      payer: &T::AccountId,
      position_key: H256,
      size_usd: u128,
      slippage_bps: u32,
    ) -> Result<H256, DispatchError> {
      ensure!(size_usd > 0, Error::<T>::ZeroAmount);
      let position = Positions::<T>::get(position_key).ok_or(Error::<T>::UnknownPosition)?;
      ensure!(size_usd <= position.size_usd, Error::<T>::ExcessiveDecrease);

      let order_key = Self::next_key(b"shield-venue-order", position.market, payer);
      Self::escrow_order(
        payer,
        VenueOrder {
          market: position.market,
          collateral_asset: position.collateral_asset,
          collateral_amount: 0,
          size_usd,
          is_long: true,
          slippage_bps,
          is_increase: false,
          position_key: Some(position_key),
          payer: payer.clone(),
          execution_fee: ExecutionFee::<T>::get(),
          status: OrderStatus::Pending,
        },
        order_key,
      )
    }

    fn position_value(position_key: H256) -> Result<u128, DispatchError> {
      Positions::<T>::get(position_key)
        .map(|p| p.value_usd)
        .ok_or(Error::<T>::UnknownPosition.into())
    }

    fn execution_fee() -> u128 {
      ExecutionFee::<T>::get()
    }
  }

  #[pallet::genesis_config]
  pub struct GenesisConfig<T: Config> {
    /// Initial execution fee in native units
    pub execution_fee: Balance,
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  impl<T: Config> Default for GenesisConfig<T> {
    fn default() -> Self {
      Self {
        execution_fee: 0,
        _marker: Default::default(),
      }
    }
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
      ExecutionFee::<T>::put(self.execution_fee);
    }
  }
}
