extern crate alloc;

use crate as pallet_shield_vault;
use polkadot_sdk::frame_support::traits::fungibles::Mutate;
use polkadot_sdk::frame_support::traits::tokens::Preservation;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{ConstU32, ConstU64, ConstU128},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, Permill,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Stand-in account holding everything the capital layer custodies.
pub const CAPITAL_ACCOUNT: u64 = 900;
pub const TREASURY: u64 = 800;
pub const FEE_COLLECTOR: u64 = 801;

#[derive(Clone, Debug, PartialEq)]
pub struct QueuedWithdrawal {
  pub asset: u32,
  pub amount: u128,
  pub recipient: u64,
  pub processed: bool,
  pub shortfall: u128,
}

thread_local! {
    pub static NAV: RefCell<u128> = const { RefCell::new(primitives::params::PRECISION) };
    pub static RESERVE_ASSETS: RefCell<BTreeMap<u32, u8>> = const { RefCell::new(BTreeMap::new()) };
    pub static HAS_TARGET: RefCell<bool> = const { RefCell::new(true) };
    pub static DEPOSITS: RefCell<Vec<(u64, u32, u128)>> = const { RefCell::new(Vec::new()) };
    pub static QUEUE_WITHDRAWALS: RefCell<bool> = const { RefCell::new(false) };
    pub static WITHDRAWALS: RefCell<BTreeMap<u64, QueuedWithdrawal>> = const { RefCell::new(BTreeMap::new()) };
    pub static NEXT_ID: RefCell<u64> = const { RefCell::new(1) };
}

pub fn set_nav(nav: u128) {
  NAV.with(|n| *n.borrow_mut() = nav);
}

pub fn set_has_target(has: bool) {
  HAS_TARGET.with(|h| *h.borrow_mut() = has);
}

pub fn set_queue_withdrawals(queue: bool) {
  QUEUE_WITHDRAWALS.with(|q| *q.borrow_mut() = queue);
}

pub fn recorded_deposits() -> Vec<(u64, u32, u128)> {
  DEPOSITS.with(|d| d.borrow().clone())
}

/// Settle a queued withdrawal: deliver `amount - shortfall` to the recorded
/// recipient and flip the processed flag, the way the basket does it.
pub fn settle_withdrawal(id: u64, shortfall: u128) {
  let w = WITHDRAWALS.with(|ws| {
    let mut ws = ws.borrow_mut();
    let w = ws.get_mut(&id).expect("unknown withdrawal");
    w.processed = true;
    w.shortfall = shortfall;
    w.clone()
  });
  let paid = w.amount.saturating_sub(shortfall);
  if paid > 0 {
    <Assets as Mutate<u64>>::transfer(
      w.asset,
      &CAPITAL_ACCOUNT,
      &w.recipient,
      paid,
      Preservation::Expendable,
    )
    .expect("capital account underfunded");
  }
}

pub struct MockNav;
impl pallet_shield_vault::NavSource for MockNav {
  fn nav_per_share() -> Result<u128, DispatchError> {
    Ok(NAV.with(|n| *n.borrow()))
  }
}

pub struct MockCapital;
impl pallet_shield_vault::CapitalDeploymentApi<u64> for MockCapital {
  fn deposit_reserves(from: &u64, asset: u32, amount: u128) -> Result<u64, DispatchError> {
    if !Self::is_reserve_asset(asset) {
      return Err(DispatchError::Other("unknown reserve asset"));
    }
    <Assets as Mutate<u64>>::transfer(
      asset,
      from,
      &CAPITAL_ACCOUNT,
      amount,
      Preservation::Expendable,
    )?;
    DEPOSITS.with(|d| d.borrow_mut().push((*from, asset, amount)));
    Ok(NEXT_ID.with(|n| {
      let mut id = n.borrow_mut();
      let current = *id;
      *id += 1;
      current
    }))
  }

  fn withdraw_reserves(
    asset: u32,
    amount: u128,
    to: &u64,
  ) -> Result<Option<u64>, DispatchError> {
    if QUEUE_WITHDRAWALS.with(|q| *q.borrow()) {
      let id = NEXT_ID.with(|n| {
        let mut id = n.borrow_mut();
        let current = *id;
        *id += 1;
        current
      });
      WITHDRAWALS.with(|ws| {
        ws.borrow_mut().insert(
          id,
          QueuedWithdrawal {
            asset,
            amount,
            recipient: *to,
            processed: false,
            shortfall: 0,
          },
        )
      });
      Ok(Some(id))
    } else {
      <Assets as Mutate<u64>>::transfer(
        asset,
        &CAPITAL_ACCOUNT,
        to,
        amount,
        Preservation::Expendable,
      )?;
      Ok(None)
    }
  }

  fn is_reserve_asset(asset: u32) -> bool {
    RESERVE_ASSETS.with(|r| r.borrow().contains_key(&asset))
  }

  fn reserve_decimals(asset: u32) -> Option<u8> {
    RESERVE_ASSETS.with(|r| r.borrow().get(&asset).cloned())
  }

  fn has_deployment_target() -> bool {
    HAS_TARGET.with(|h| *h.borrow())
  }

  fn withdrawal_state(id: u64) -> Option<(bool, u128)> {
    WITHDRAWALS.with(|ws| ws.borrow().get(&id).map(|w| (w.processed, w.shortfall)))
  }
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    ShieldVault: pallet_shield_vault,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  type ReserveData = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ();
}

parameter_types! {
  pub const VaultPalletId: PalletId = PalletId(*primitives::pallet_ids::SHIELD_VAULT_PALLET_ID);
  pub const TreasuryAccount: u64 = TREASURY;
  pub const DeploymentFeeAccount: u64 = FEE_COLLECTOR;
  pub const MintFee: Permill = primitives::params::MINT_FEE;
  pub const RedeemFee: Permill = primitives::params::REDEEM_FEE;
}

impl pallet_shield_vault::Config for Test {
  type Assets = Assets;
  type Currency = Balances;
  type Capital = MockCapital;
  type Nav = MockNav;
  type ExecutorOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type PalletId = VaultPalletId;
  type TreasuryAccount = TreasuryAccount;
  type DeploymentFeeAccount = DeploymentFeeAccount;
  type MintFee = MintFee;
  type RedeemFee = RedeemFee;
  type MinDepositUsd = ConstU128<{ primitives::params::MIN_DEPOSIT_USD }>;
  type MaxExecutionFee = ConstU128<{ primitives::params::MAX_EXECUTION_FEE }>;
  type NavDeviationToleranceBps = ConstU32<{ primitives::params::NAV_DEVIATION_TOLERANCE_BPS }>;
  type IntentTtl = ConstU64<100>;
  type RedeemBaseCooldown = ConstU64<50>;
  type RedeemWindowLength = ConstU64<200>;
  type CongestionRedeemerThreshold = ConstU32<2>;
  type MaxWindowRedeemBps = ConstU32<{ primitives::params::MAX_WINDOW_REDEEM_BPS }>;
  type WeightInfo = ();
}

pub const USDC: u32 = 1;
pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: alloc::vec![(USDC, ALICE, true, 1)],
    metadata: alloc::vec![],
    accounts: alloc::vec![
      // 6-decimal balances; the capital account is pre-funded for instant payouts
      (USDC, ALICE, 1_000_000_000_000),
      (USDC, BOB, 1_000_000_000_000),
      (USDC, CAPITAL_ACCOUNT, 1_000_000_000_000),
    ],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_shield_vault::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  NAV.with(|n| *n.borrow_mut() = primitives::params::PRECISION);
  RESERVE_ASSETS.with(|r| {
    let mut r = r.borrow_mut();
    r.clear();
    r.insert(USDC, 6);
  });
  HAS_TARGET.with(|h| *h.borrow_mut() = true);
  DEPOSITS.with(|d| d.borrow_mut().clear());
  QUEUE_WITHDRAWALS.with(|q| *q.borrow_mut() = false);
  WITHDRAWALS.with(|w| w.borrow_mut().clear());
  NEXT_ID.with(|n| *n.borrow_mut() = 1);

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| frame_system::Pallet::<Test>::set_block_number(1));
  ext
}
