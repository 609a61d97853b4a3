extern crate alloc;

use crate as pallet_basket_manager;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, ConstU128, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedOrder {
  pub key: H256,
  pub market: H256,
  pub collateral_asset: u32,
  pub collateral_amount: u128,
  pub size_usd: u128,
  pub is_increase: bool,
}

thread_local! {
    pub static ORDERS: RefCell<Vec<RecordedOrder>> = const { RefCell::new(Vec::new()) };
    pub static NEXT_ORDER: RefCell<u8> = const { RefCell::new(1) };
    pub static POSITION_VALUES: RefCell<BTreeMap<H256, u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static FAIL_SUBMISSION: RefCell<bool> = const { RefCell::new(false) };
}

pub fn set_position_value(key: H256, value_usd: u128) {
  POSITION_VALUES.with(|p| p.borrow_mut().insert(key, value_usd));
}

pub fn set_fail_submission(fail: bool) {
  FAIL_SUBMISSION.with(|f| *f.borrow_mut() = fail);
}

pub fn submitted_orders() -> Vec<RecordedOrder> {
  ORDERS.with(|o| o.borrow().clone())
}

pub fn last_order() -> RecordedOrder {
  ORDERS.with(|o| o.borrow().last().cloned().expect("no orders submitted"))
}

/// Venue stub: records submitted orders and hands back deterministic keys; tests
/// then resolve them by calling the callback handler directly.
pub struct MockVenue;
impl pallet_basket_manager::PositionVenue<u64> for MockVenue {
  fn open_position(
    _payer: &u64,
    market: H256,
    collateral_asset: u32,
    collateral_amount: u128,
    size_usd: u128,
    _is_long: bool,
    _slippage_bps: u32,
  ) -> Result<H256, DispatchError> {
    if FAIL_SUBMISSION.with(|f| *f.borrow()) {
      return Err(DispatchError::Other("venue rejected order"));
    }
    let key = next_order_key();
    ORDERS.with(|o| {
      o.borrow_mut().push(RecordedOrder {
        key,
        market,
        collateral_asset,
        collateral_amount,
        size_usd,
        is_increase: true,
      })
    });
    Ok(key)
  }

  fn close_position(
    _payer: &u64,
    position_key: H256,
    size_usd: u128,
    _slippage_bps: u32,
  ) -> Result<H256, DispatchError> {
    if FAIL_SUBMISSION.with(|f| *f.borrow()) {
      return Err(DispatchError::Other("venue rejected order"));
    }
    let key = next_order_key();
    ORDERS.with(|o| {
      o.borrow_mut().push(RecordedOrder {
        key,
        market: position_key,
        collateral_asset: 0,
        collateral_amount: 0,
        size_usd,
        is_increase: false,
      })
    });
    Ok(key)
  }

  fn position_value(position_key: H256) -> Result<u128, DispatchError> {
    POSITION_VALUES
      .with(|p| p.borrow().get(&position_key).cloned())
      .ok_or(DispatchError::Other("unknown position"))
  }

  fn execution_fee() -> u128 {
    0
  }
}

fn next_order_key() -> H256 {
  NEXT_ORDER.with(|n| {
    let mut id = n.borrow_mut();
    let key = H256::repeat_byte(*id);
    *id += 1;
    key
  })
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    BasketManager: pallet_basket_manager,
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

pub struct PalletIdStub;
impl Get<PalletId> for PalletIdStub {
  fn get() -> PalletId {
    PalletId(*primitives::pallet_ids::BASKET_MANAGER_PALLET_ID)
  }
}

impl pallet_basket_manager::Config for Test {
  type Assets = Assets;
  type Currency = Balances;
  type Venue = MockVenue;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type KeeperOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type PalletId = PalletIdStub;
  type MinDeploymentThresholdUsd =
    ConstU128<{ primitives::params::MIN_DEPLOYMENT_THRESHOLD_USD }>;
  type DeploymentDustFloorUsd = ConstU128<{ primitives::params::DEPLOYMENT_DUST_FLOOR_USD }>;
  type EmergencyBufferBps = ConstU32<{ primitives::params::EMERGENCY_BUFFER_BPS }>;
  type OverCloseBufferBps = ConstU32<{ primitives::params::OVER_CLOSE_BUFFER_BPS }>;
  type RebalanceToleranceBps = ConstU32<{ primitives::params::REBALANCE_TOLERANCE_BPS }>;
  type DefaultSlippageBps = ConstU32<{ primitives::params::DEFAULT_SLIPPAGE_BPS }>;
  type MinRebalanceCooldown = ConstU64<10>;
  type MaxRebalanceCooldown = ConstU64<100_000>;
  type MaxBasketEntries = ConstU32<16>;
  type WeightInfo = ();
}

pub const USDC: u32 = 1;
pub const USDT: u32 = 2;
pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: alloc::vec![(USDC, ALICE, true, 1), (USDT, ALICE, true, 1)],
    metadata: alloc::vec![],
    accounts: alloc::vec![
      // 6-decimal stablecoins, 1M each
      (USDC, ALICE, 1_000_000_000_000),
      (USDT, ALICE, 1_000_000_000_000),
      (USDC, BOB, 1_000_000_000_000),
    ],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_basket_manager::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  ORDERS.with(|o| o.borrow_mut().clear());
  NEXT_ORDER.with(|n| *n.borrow_mut() = 1);
  POSITION_VALUES.with(|p| p.borrow_mut().clear());
  FAIL_SUBMISSION.with(|f| *f.borrow_mut() = false);

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| frame_system::Pallet::<Test>::set_block_number(1));
  ext
}
