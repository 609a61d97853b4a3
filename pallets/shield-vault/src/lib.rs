//! Shield Vault Pallet
//!
//! Two-phase intent engine for SHIELD index shares. Users create mint/redeem
//! intents that lock the NAV they saw; a permissioned executor settles them against
//! the capital deployment layer, re-pricing only when the NAV has drifted beyond
//! tolerance. Redemptions pass through an adaptive per-user cooldown and a rolling
//! window volume cap before any capital moves.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

pub mod types;
pub mod weights;
pub use weights::WeightInfo;

use frame::deps::sp_runtime::DispatchError;

/// NAV oracle for the share token, in 18-decimal USD per share.
pub trait NavSource {
  fn nav_per_share() -> Result<u128, DispatchError>;
}

/// Interface to the capital deployment layer holding protocol reserves.
///
/// Deposits are forwarded immediately; withdrawals either pay instantly from idle
/// reserves (`Ok(None)`) or queue position liquidations and return the pending
/// withdrawal id to poll through `withdrawal_state`.
pub trait CapitalDeploymentApi<AccountId> {
  fn deposit_reserves(from: &AccountId, asset: u32, amount: u128) -> Result<u64, DispatchError>;

  fn withdraw_reserves(
    asset: u32,
    amount: u128,
    to: &AccountId,
  ) -> Result<Option<u64>, DispatchError>;

  fn is_reserve_asset(asset: u32) -> bool;

  fn reserve_decimals(asset: u32) -> Option<u8>;

  fn has_deployment_target() -> bool;

  /// `(is_processed, shortfall)` for a queued withdrawal
  fn withdrawal_state(id: u64) -> Option<(bool, u128)>;
}

#[frame::pallet]
pub mod pallet {
  use super::{CapitalDeploymentApi, NavSource, WeightInfo};
  use crate::types::{Balance, IntentStatus, MintIntent, RedeemIntent, WithdrawalId};
  use frame::deps::{
    frame_support::{
      PalletId,
      traits::{
        EnsureOrigin,
        fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
        fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
        tokens::{Fortitude, Precision, Preservation},
      },
    },
    sp_core::U256,
    sp_runtime::{
      DispatchError, Permill,
      traits::{AccountIdConversion, Hash, Saturating},
    },
  };
  use frame::prelude::*;
  use primitives::params::{
    BPS_DENOMINATOR, CONGESTION_COOLDOWN_MULTIPLIER, PRECISION,
    REPEAT_REDEEMER_COOLDOWN_MULTIPLIER,
  };
  use primitives::{deviation_bps, from_usd_18, to_usd_18};

  pub const LOG_TARGET: &str = "runtime::shield-vault";

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for reserve stablecoins
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = u128>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = u128>;

    /// The share token. Mintable on deposit settlement, burnable on redemption.
    type Currency: NativeInspect<Self::AccountId, Balance = u128>
      + NativeMutate<Self::AccountId, Balance = u128>;

    /// Capital deployment layer the principal flows through
    type Capital: CapitalDeploymentApi<Self::AccountId>;

    /// NAV oracle for settlement pricing
    type Nav: NavSource;

    /// Origin allowed to settle intents
    type ExecutorOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Pallet ID for the intent escrow account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Receives fee-equivalent share mints
    #[pallet::constant]
    type TreasuryAccount: Get<Self::AccountId>;

    /// Receives execution-fee escrow on settlement
    #[pallet::constant]
    type DeploymentFeeAccount: Get<Self::AccountId>;

    /// Share-denominated fee on mints
    #[pallet::constant]
    type MintFee: Get<Permill>;

    /// Share-denominated fee on redemptions
    #[pallet::constant]
    type RedeemFee: Get<Permill>;

    /// Minimum deposit value in 18-decimal USD
    #[pallet::constant]
    type MinDepositUsd: Get<Balance>;

    /// Cap on the native execution fee escrowed with an intent
    #[pallet::constant]
    type MaxExecutionFee: Get<Balance>;

    /// NAV drift beyond which settlement re-prices at the current NAV
    #[pallet::constant]
    type NavDeviationToleranceBps: Get<u32>;

    /// Blocks until a pending intent becomes refundable by its owner
    #[pallet::constant]
    type IntentTtl: Get<BlockNumberFor<Self>>;

    /// Base per-user redemption cooldown
    #[pallet::constant]
    type RedeemBaseCooldown: Get<BlockNumberFor<Self>>;

    /// Length of the rolling redemption window
    #[pallet::constant]
    type RedeemWindowLength: Get<BlockNumberFor<Self>>;

    /// Distinct redeemers per window above which cooldowns double
    #[pallet::constant]
    type CongestionRedeemerThreshold: Get<u32>;

    /// Window volume cap as a fraction of share supply, in basis points
    #[pallet::constant]
    type MaxWindowRedeemBps: Get<u32>;

    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn mint_intent)]
  pub type MintIntents<T: Config> = StorageMap<
    _,
    Blake2_128Concat,
    T::Hash,
    MintIntent<T::AccountId, BlockNumberFor<T>>,
    OptionQuery,
  >;

  #[pallet::storage]
  #[pallet::getter(fn redeem_intent)]
  pub type RedeemIntents<T: Config> = StorageMap<
    _,
    Blake2_128Concat,
    T::Hash,
    RedeemIntent<T::AccountId, BlockNumberFor<T>>,
    OptionQuery,
  >;

  /// Monotone counter folded into intent ids
  #[pallet::storage]
  pub type IntentNonce<T: Config> = StorageValue<_, u64, ValueQuery>;

  /// Block of each user's last accepted redemption intent
  #[pallet::storage]
  pub type LastRedeemAt<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, BlockNumberFor<T>, OptionQuery>;

  /// Start of the current redemption window. Anchored by the first redemption
  /// ever seen and re-anchored by the first one after the previous window has
  /// fully elapsed.
  #[pallet::storage]
  pub type RedeemWindowStart<T: Config> = StorageValue<_, BlockNumberFor<T>, OptionQuery>;

  /// Shares redeemed in the current window
  #[pallet::storage]
  pub type WindowRedeemVolume<T: Config> = StorageValue<_, Balance, ValueQuery>;

  /// Distinct redeemers seen in the current window
  #[pallet::storage]
  pub type WindowRedeemers<T: Config> = StorageValue<_, u32, ValueQuery>;

  /// Window start each user last redeemed in, for repeat detection
  #[pallet::storage]
  pub type UserLastWindow<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, BlockNumberFor<T>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    MintIntentCreated {
      intent_id: T::Hash,
      user: T::AccountId,
      asset: u32,
      amount: Balance,
      amount_usd: Balance,
      locked_nav: Balance,
    },
    /// Settlement minted shares; `nav` is the price actually used
    MintIntentExecuted {
      intent_id: T::Hash,
      user: T::AccountId,
      shares: Balance,
      fee_shares: Balance,
      nav: Balance,
    },
    /// Settlement re-priced at the current NAV because the locked one drifted
    NavDeviationApplied {
      intent_id: T::Hash,
      locked_nav: Balance,
      current_nav: Balance,
    },
    MintIntentCancelled {
      intent_id: T::Hash,
    },
    MintIntentRefunded {
      intent_id: T::Hash,
      refund_id: Option<WithdrawalId>,
    },
    RedeemIntentCreated {
      intent_id: T::Hash,
      user: T::AccountId,
      asset: u32,
      shares: Balance,
      locked_nav: Balance,
    },
    /// Redemption settled instantly from idle reserves
    RedeemIntentExecuted {
      intent_id: T::Hash,
      user: T::AccountId,
      payout: Balance,
      fee_shares: Balance,
      nav: Balance,
    },
    /// Payout needed liquidation; the intent is parked until the venue settles
    RedeemIntentQueued {
      intent_id: T::Hash,
      withdrawal_id: WithdrawalId,
      payout: Balance,
    },
    /// A queued redemption finished; `shortfall` is the unpaid remainder, if any
    RedeemIntentCompleted {
      intent_id: T::Hash,
      user: T::AccountId,
      paid: Balance,
      shortfall: Balance,
    },
    RedeemIntentCancelled {
      intent_id: T::Hash,
    },
    RedeemIntentRefunded {
      intent_id: T::Hash,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Asset is not an active reserve stablecoin
    UnsupportedAsset,
    /// Deposit value below the vault minimum
    BelowMinimumDeposit,
    /// Execution fee above the configured cap
    ExcessiveExecutionFee,
    /// No active basket entry carries weight; deposits cannot deploy
    NoDeploymentTarget,
    /// NAV source returned zero
    InvalidNav,
    /// Computed share or payout amount is zero
    ZeroAmount,
    /// Intent id not found
    UnknownIntent,
    /// Intent is not in the state this operation requires
    IntentNotPending,
    /// Intent is past its TTL
    IntentExpired,
    /// Intent has not reached its TTL yet
    IntentNotExpired,
    /// Caller is not the intent owner
    NotIntentOwner,
    /// Queued redemption is not awaiting completion
    IntentNotProcessing,
    /// The linked withdrawal has not settled yet
    WithdrawalPending,
    /// The linked withdrawal record disappeared
    UnknownWithdrawal,
    /// Per-user redemption cooldown has not elapsed
    RedeemCooldownActive,
    /// Window redemption volume cap would be exceeded
    RedeemWindowCapExceeded,
    /// Arithmetic overflow occurred
    ArithmeticOverflow,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create a mint intent: lock the current NAV, escrow the execution fee and
    /// forward the stablecoin principal into basket reserves.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_mint_intent())]
    pub fn create_mint_intent(
      origin: OriginFor<T>,
      asset: u32,
      amount: Balance,
      execution_fee: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;

      ensure!(
        execution_fee <= T::MaxExecutionFee::get(),
        Error::<T>::ExcessiveExecutionFee
      );
      ensure!(
        T::Capital::is_reserve_asset(asset),
        Error::<T>::UnsupportedAsset
      );
      let decimals = T::Capital::reserve_decimals(asset).ok_or(Error::<T>::UnsupportedAsset)?;
      let amount_usd = to_usd_18(amount, decimals).ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(
        amount_usd >= T::MinDepositUsd::get(),
        Error::<T>::BelowMinimumDeposit
      );
      ensure!(
        T::Capital::has_deployment_target(),
        Error::<T>::NoDeploymentTarget
      );

      let locked_nav = Self::current_nav()?;
      let shares = Self::compute_shares(amount_usd, locked_nav)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(shares > 0, Error::<T>::ZeroAmount);

      if execution_fee > 0 {
        T::Currency::transfer(
          &who,
          &Self::account_id(),
          execution_fee,
          Preservation::Expendable,
        )?;
      }
      let deposit_id = T::Capital::deposit_reserves(&who, asset, amount)?;

      let now = frame_system::Pallet::<T>::block_number();
      let intent_id = Self::next_intent_id(b"shield-mint", &who, asset, amount, now);
      MintIntents::<T>::insert(
        intent_id,
        MintIntent {
          user: who.clone(),
          asset,
          amount,
          amount_usd,
          locked_nav,
          execution_fee,
          deposit_id,
          refund_id: None,
          created_at: now,
          expires_at: now.saturating_add(T::IntentTtl::get()),
          status: IntentStatus::Pending,
          actual_shares: 0,
          final_nav: 0,
        },
      );

      Self::deposit_event(Event::MintIntentCreated {
        intent_id,
        user: who,
        asset,
        amount,
        amount_usd,
        locked_nav,
      });

      Ok(())
    }

    /// Settle a pending mint intent, minting shares at the locked NAV or, if the
    /// NAV has drifted beyond tolerance, at the current one.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::execute_mint_intent())]
    pub fn execute_mint_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      T::ExecutorOrigin::ensure_origin(origin)?;

      let mut intent = MintIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      ensure!(
        intent.status == IntentStatus::Pending,
        Error::<T>::IntentNotPending
      );
      let now = frame_system::Pallet::<T>::block_number();
      ensure!(now <= intent.expires_at, Error::<T>::IntentExpired);

      let nav = Self::settlement_nav(intent_id, intent.locked_nav)?;
      let gross = Self::compute_shares(intent.amount_usd, nav)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(gross > 0, Error::<T>::ZeroAmount);
      let fee_shares = T::MintFee::get() * gross;
      let user_shares = gross.saturating_sub(fee_shares);

      T::Currency::mint_into(&intent.user, user_shares)?;
      if fee_shares > 0 {
        T::Currency::mint_into(&T::TreasuryAccount::get(), fee_shares)?;
      }
      Self::release_execution_fee(intent.execution_fee, &T::DeploymentFeeAccount::get())?;

      intent.status = IntentStatus::Completed;
      intent.actual_shares = user_shares;
      intent.final_nav = nav;
      let user = intent.user.clone();
      MintIntents::<T>::insert(intent_id, intent);

      Self::deposit_event(Event::MintIntentExecuted {
        intent_id,
        user,
        shares: user_shares,
        fee_shares,
        nav,
      });

      Ok(())
    }

    /// Owner cancellation of a still-pending, unexpired mint intent. The principal
    /// is clawed back out of reserves and the fee escrow returned.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::cancel_mint_intent())]
    pub fn cancel_mint_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      let who = ensure_signed(origin)?;

      let mut intent = MintIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      ensure!(intent.user == who, Error::<T>::NotIntentOwner);
      ensure!(
        intent.status == IntentStatus::Pending,
        Error::<T>::IntentNotPending
      );
      let now = frame_system::Pallet::<T>::block_number();
      ensure!(now <= intent.expires_at, Error::<T>::IntentExpired);

      Self::unwind_mint(&mut intent)?;
      intent.status = IntentStatus::Cancelled;
      MintIntents::<T>::insert(intent_id, intent);

      Self::deposit_event(Event::MintIntentCancelled { intent_id });

      Ok(())
    }

    /// Refund a pending mint intent: by the executor at any time, or by the owner
    /// once the TTL has passed.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::refund_mint_intent())]
    pub fn refund_mint_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      let mut intent = MintIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      Self::ensure_executor_or_expired_owner(origin, &intent.user, intent.expires_at)?;
      ensure!(
        intent.status == IntentStatus::Pending,
        Error::<T>::IntentNotPending
      );

      Self::unwind_mint(&mut intent)?;
      intent.status = IntentStatus::Refunded;
      let refund_id = intent.refund_id;
      MintIntents::<T>::insert(intent_id, intent);

      Self::deposit_event(Event::MintIntentRefunded {
        intent_id,
        refund_id,
      });

      Ok(())
    }

    /// Create a redeem intent: pass the adaptive cooldown and window cap, lock the
    /// current NAV and escrow the shares.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::create_redeem_intent())]
    pub fn create_redeem_intent(
      origin: OriginFor<T>,
      asset: u32,
      shares: Balance,
      execution_fee: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;

      ensure!(
        execution_fee <= T::MaxExecutionFee::get(),
        Error::<T>::ExcessiveExecutionFee
      );
      ensure!(shares > 0, Error::<T>::ZeroAmount);
      ensure!(
        T::Capital::is_reserve_asset(asset),
        Error::<T>::UnsupportedAsset
      );
      let locked_nav = Self::current_nav()?;

      Self::apply_redeem_throttle(&who, shares)?;

      if execution_fee > 0 {
        T::Currency::transfer(
          &who,
          &Self::account_id(),
          execution_fee,
          Preservation::Expendable,
        )?;
      }
      T::Currency::transfer(&who, &Self::account_id(), shares, Preservation::Expendable)?;

      let now = frame_system::Pallet::<T>::block_number();
      let intent_id = Self::next_intent_id(b"shield-redeem", &who, asset, shares, now);
      RedeemIntents::<T>::insert(
        intent_id,
        RedeemIntent {
          user: who.clone(),
          asset,
          shares,
          locked_nav,
          execution_fee,
          withdrawal_id: None,
          payout_amount: 0,
          created_at: now,
          expires_at: now.saturating_add(T::IntentTtl::get()),
          status: IntentStatus::Pending,
          final_nav: 0,
        },
      );

      Self::deposit_event(Event::RedeemIntentCreated {
        intent_id,
        user: who,
        asset,
        shares,
        locked_nav,
      });

      Ok(())
    }

    /// Settle a pending redeem intent. Pays out instantly when idle reserves
    /// cover the payout; otherwise parks the intent as `Processing` behind the
    /// liquidation queue.
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::execute_redeem_intent())]
    pub fn execute_redeem_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      T::ExecutorOrigin::ensure_origin(origin)?;

      let mut intent = RedeemIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      ensure!(
        intent.status == IntentStatus::Pending,
        Error::<T>::IntentNotPending
      );
      let now = frame_system::Pallet::<T>::block_number();
      ensure!(now <= intent.expires_at, Error::<T>::IntentExpired);

      let nav = Self::settlement_nav(intent_id, intent.locked_nav)?;
      let fee_shares = T::RedeemFee::get() * intent.shares;
      let net_shares = intent.shares.saturating_sub(fee_shares);
      let payout_usd =
        Self::compute_value(net_shares, nav).ok_or(Error::<T>::ArithmeticOverflow)?;
      let decimals =
        T::Capital::reserve_decimals(intent.asset).ok_or(Error::<T>::UnsupportedAsset)?;
      let payout_amount =
        from_usd_18(payout_usd, decimals).ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(payout_amount > 0, Error::<T>::ZeroAmount);

      intent.final_nav = nav;
      intent.payout_amount = payout_amount;

      match T::Capital::withdraw_reserves(intent.asset, payout_amount, &Self::account_id())? {
        None => {
          Self::settle_redeem_payout(&mut intent, payout_amount)?;
          let user = intent.user.clone();
          RedeemIntents::<T>::insert(intent_id, intent);
          Self::deposit_event(Event::RedeemIntentExecuted {
            intent_id,
            user,
            payout: payout_amount,
            fee_shares,
            nav,
          });
        }
        Some(withdrawal_id) => {
          log::debug!(
            target: LOG_TARGET,
            "redeem intent {intent_id:?} queued behind withdrawal {withdrawal_id}"
          );
          intent.status = IntentStatus::Processing;
          intent.withdrawal_id = Some(withdrawal_id);
          RedeemIntents::<T>::insert(intent_id, intent);
          Self::deposit_event(Event::RedeemIntentQueued {
            intent_id,
            withdrawal_id,
            payout: payout_amount,
          });
        }
      }

      Ok(())
    }

    /// Finalize a queued redemption after its liquidation settled. Pays whatever
    /// the basket actually raised and surfaces any shortfall instead of silently
    /// absorbing it.
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::complete_redeem_intent())]
    pub fn complete_redeem_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      T::ExecutorOrigin::ensure_origin(origin)?;

      let mut intent = RedeemIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      ensure!(
        intent.status == IntentStatus::Processing,
        Error::<T>::IntentNotProcessing
      );
      let withdrawal_id = intent.withdrawal_id.ok_or(Error::<T>::UnknownWithdrawal)?;
      let (processed, shortfall) =
        T::Capital::withdrawal_state(withdrawal_id).ok_or(Error::<T>::UnknownWithdrawal)?;
      ensure!(processed, Error::<T>::WithdrawalPending);

      let paid = intent.payout_amount.saturating_sub(shortfall);
      Self::settle_redeem_payout(&mut intent, paid)?;
      let user = intent.user.clone();
      RedeemIntents::<T>::insert(intent_id, intent);

      Self::deposit_event(Event::RedeemIntentCompleted {
        intent_id,
        user,
        paid,
        shortfall,
      });

      Ok(())
    }

    /// Owner cancellation of a still-pending, unexpired redeem intent. Escrowed
    /// shares and fee come back untouched; throttle bookkeeping stays committed.
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::cancel_redeem_intent())]
    pub fn cancel_redeem_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      let who = ensure_signed(origin)?;

      let mut intent = RedeemIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      ensure!(intent.user == who, Error::<T>::NotIntentOwner);
      ensure!(
        intent.status == IntentStatus::Pending,
        Error::<T>::IntentNotPending
      );
      let now = frame_system::Pallet::<T>::block_number();
      ensure!(now <= intent.expires_at, Error::<T>::IntentExpired);

      Self::return_redeem_escrow(&intent)?;
      intent.status = IntentStatus::Cancelled;
      RedeemIntents::<T>::insert(intent_id, intent);

      Self::deposit_event(Event::RedeemIntentCancelled { intent_id });

      Ok(())
    }

    /// Refund a redeem intent: pending intents return the share escrow directly;
    /// a queued intent can only unwind once its withdrawal settled, in which case
    /// the raised cash is re-deposited into reserves.
    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::refund_redeem_intent())]
    pub fn refund_redeem_intent(origin: OriginFor<T>, intent_id: T::Hash) -> DispatchResult {
      let mut intent = RedeemIntents::<T>::get(intent_id).ok_or(Error::<T>::UnknownIntent)?;
      Self::ensure_executor_or_expired_owner(origin, &intent.user, intent.expires_at)?;

      match intent.status {
        IntentStatus::Pending => {}
        IntentStatus::Processing => {
          let withdrawal_id = intent.withdrawal_id.ok_or(Error::<T>::UnknownWithdrawal)?;
          let (processed, shortfall) =
            T::Capital::withdrawal_state(withdrawal_id).ok_or(Error::<T>::UnknownWithdrawal)?;
          ensure!(processed, Error::<T>::WithdrawalPending);

          // the raised cash sits in the vault account; put it back to work
          let raised = intent.payout_amount.saturating_sub(shortfall);
          if raised > 0 {
            T::Capital::deposit_reserves(&Self::account_id(), intent.asset, raised)?;
          }
        }
        _ => return Err(Error::<T>::IntentNotPending.into()),
      }

      Self::return_redeem_escrow(&intent)?;
      intent.status = IntentStatus::Refunded;
      RedeemIntents::<T>::insert(intent_id, intent);

      Self::deposit_event(Event::RedeemIntentRefunded { intent_id });

      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Get the pallet's account ID (intent escrow)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Shares a deposit would mint at the current NAV: `(user_shares, fee_shares,
    /// nav)`. Settlement agrees with this exactly while the NAV stays within
    /// tolerance of the locked value.
    pub fn preview_mint(asset: u32, amount: Balance) -> Option<(Balance, Balance, Balance)> {
      let decimals = T::Capital::reserve_decimals(asset)?;
      let amount_usd = to_usd_18(amount, decimals)?;
      let nav = T::Nav::nav_per_share().ok()?;
      let gross = Self::compute_shares(amount_usd, nav)?;
      let fee_shares = T::MintFee::get() * gross;
      Some((gross.saturating_sub(fee_shares), fee_shares, nav))
    }

    /// Stablecoin payout a redemption would produce at the current NAV:
    /// `(payout_amount, fee_shares, nav)`.
    pub fn preview_redeem(asset: u32, shares: Balance) -> Option<(Balance, Balance, Balance)> {
      let decimals = T::Capital::reserve_decimals(asset)?;
      let nav = T::Nav::nav_per_share().ok()?;
      let fee_shares = T::RedeemFee::get() * shares;
      let payout_usd = Self::compute_value(shares.saturating_sub(fee_shares), nav)?;
      Some((from_usd_18(payout_usd, decimals)?, fee_shares, nav))
    }

    fn current_nav() -> Result<Balance, DispatchError> {
      let nav = T::Nav::nav_per_share()?;
      ensure!(nav > 0, Error::<T>::InvalidNav);
      Ok(nav)
    }

    /// Locked NAV while within tolerance, current NAV otherwise. The rule is
    /// symmetric: drift in the user's favor re-prices just the same.
    fn settlement_nav(intent_id: T::Hash, locked_nav: Balance) -> Result<Balance, DispatchError> {
      let current = Self::current_nav()?;
      if deviation_bps(current, locked_nav) > T::NavDeviationToleranceBps::get() {
        log::warn!(
          target: LOG_TARGET,
          "intent {intent_id:?} repriced: locked nav {locked_nav}, current {current}"
        );
        Self::deposit_event(Event::NavDeviationApplied {
          intent_id,
          locked_nav,
          current_nav: current,
        });
        Ok(current)
      } else {
        Ok(locked_nav)
      }
    }

    /// `usd * 10^18 / nav` with a 256-bit intermediate
    fn compute_shares(amount_usd: Balance, nav: Balance) -> Option<Balance> {
      if nav == 0 {
        return None;
      }
      let shares = U256::from(amount_usd)
        .checked_mul(U256::from(PRECISION))?
        .checked_div(U256::from(nav))?;
      shares.try_into().ok()
    }

    /// `shares * nav / 10^18` with a 256-bit intermediate
    fn compute_value(shares: Balance, nav: Balance) -> Option<Balance> {
      let value = U256::from(shares)
        .checked_mul(U256::from(nav))?
        .checked_div(U256::from(PRECISION))?;
      value.try_into().ok()
    }

    fn next_intent_id(
      tag: &[u8],
      who: &T::AccountId,
      asset: u32,
      amount: Balance,
      now: BlockNumberFor<T>,
    ) -> T::Hash {
      let nonce = IntentNonce::<T>::mutate(|n| {
        *n = n.saturating_add(1);
        *n
      });
      T::Hashing::hash_of(&(tag, who, asset, amount, now, nonce))
    }

    fn ensure_executor_or_expired_owner(
      origin: OriginFor<T>,
      owner: &T::AccountId,
      expires_at: BlockNumberFor<T>,
    ) -> DispatchResult {
      if T::ExecutorOrigin::ensure_origin(origin.clone()).is_ok() {
        return Ok(());
      }
      let who = ensure_signed(origin)?;
      ensure!(&who == owner, Error::<T>::NotIntentOwner);
      let now = frame_system::Pallet::<T>::block_number();
      ensure!(now > expires_at, Error::<T>::IntentNotExpired);
      Ok(())
    }

    /// Evaluate and commit the adaptive throttle for one accepted redemption.
    ///
    /// Same-window repeat redeemers wait 3x the base cooldown, everyone waits 2x
    /// under congestion, and total window volume is capped as a fraction of share
    /// supply. The window re-anchors at the first redemption after the previous
    /// one fully elapsed.
    fn apply_redeem_throttle(who: &T::AccountId, shares: Balance) -> DispatchResult {
      let now = frame_system::Pallet::<T>::block_number();
      // a window only exists once a redemption has anchored it
      let current_window = RedeemWindowStart::<T>::get()
        .filter(|start| now < start.saturating_add(T::RedeemWindowLength::get()));

      let multiplier = if current_window.is_some()
        && UserLastWindow::<T>::get(who) == current_window
      {
        REPEAT_REDEEMER_COOLDOWN_MULTIPLIER
      } else if current_window.is_some()
        && WindowRedeemers::<T>::get() > T::CongestionRedeemerThreshold::get()
      {
        CONGESTION_COOLDOWN_MULTIPLIER
      } else {
        1
      };
      if let Some(last) = LastRedeemAt::<T>::get(who) {
        let cooldown = T::RedeemBaseCooldown::get().saturating_mul(multiplier.into());
        ensure!(
          now >= last.saturating_add(cooldown),
          Error::<T>::RedeemCooldownActive
        );
      }

      let volume = if current_window.is_some() {
        WindowRedeemVolume::<T>::get()
      } else {
        0
      };
      let cap = T::Currency::total_issuance()
        .saturating_mul(T::MaxWindowRedeemBps::get() as u128)
        / BPS_DENOMINATOR;
      ensure!(
        volume.saturating_add(shares) <= cap,
        Error::<T>::RedeemWindowCapExceeded
      );

      match current_window {
        Some(start) => {
          WindowRedeemVolume::<T>::put(volume.saturating_add(shares));
          if UserLastWindow::<T>::get(who) != Some(start) {
            WindowRedeemers::<T>::mutate(|r| *r = r.saturating_add(1));
          }
          UserLastWindow::<T>::insert(who, start);
        }
        None => {
          RedeemWindowStart::<T>::put(now);
          WindowRedeemVolume::<T>::put(shares);
          WindowRedeemers::<T>::put(1);
          UserLastWindow::<T>::insert(who, now);
        }
      }
      LastRedeemAt::<T>::insert(who, now);

      Ok(())
    }

    /// Claw a pending mint's principal back out of reserves and return the fee
    /// escrow. The repayment may itself queue a liquidation; the basket then owes
    /// the user directly.
    fn unwind_mint(
      intent: &mut MintIntent<T::AccountId, BlockNumberFor<T>>,
    ) -> DispatchResult {
      intent.refund_id =
        T::Capital::withdraw_reserves(intent.asset, intent.amount, &intent.user)?;
      if let Some(refund_id) = intent.refund_id {
        log::debug!(
          target: LOG_TARGET,
          "mint principal repayment queued behind withdrawal {refund_id}"
        );
      }
      Self::release_execution_fee(intent.execution_fee, &intent.user)?;
      Ok(())
    }

    fn return_redeem_escrow(
      intent: &RedeemIntent<T::AccountId, BlockNumberFor<T>>,
    ) -> DispatchResult {
      T::Currency::transfer(
        &Self::account_id(),
        &intent.user,
        intent.shares,
        Preservation::Expendable,
      )?;
      Self::release_execution_fee(intent.execution_fee, &intent.user)?;
      Ok(())
    }

    /// Pay the stablecoin out of the vault account, burn the net share escrow and
    /// move the fee share to the treasury.
    fn settle_redeem_payout(
      intent: &mut RedeemIntent<T::AccountId, BlockNumberFor<T>>,
      paid: Balance,
    ) -> DispatchResult {
      if paid > 0 {
        T::Assets::transfer(
          intent.asset,
          &Self::account_id(),
          &intent.user,
          paid,
          Preservation::Expendable,
        )?;
      }

      let fee_shares = T::RedeemFee::get() * intent.shares;
      let net_shares = intent.shares.saturating_sub(fee_shares);
      T::Currency::burn_from(
        &Self::account_id(),
        net_shares,
        Preservation::Expendable,
        Precision::Exact,
        Fortitude::Polite,
      )?;
      if fee_shares > 0 {
        T::Currency::transfer(
          &Self::account_id(),
          &T::TreasuryAccount::get(),
          fee_shares,
          Preservation::Expendable,
        )?;
      }
      Self::release_execution_fee(intent.execution_fee, &T::DeploymentFeeAccount::get())?;

      intent.status = IntentStatus::Completed;
      Ok(())
    }

    fn release_execution_fee(fee: Balance, to: &T::AccountId) -> DispatchResult {
      if fee > 0 {
        T::Currency::transfer(&Self::account_id(), to, fee, Preservation::Expendable)?;
      }
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
      frame_system::Pallet::<T>::inc_providers(&T::TreasuryAccount::get());
      frame_system::Pallet::<T>::inc_providers(&T::DeploymentFeeAccount::get());
    }
  }
}
