extern crate alloc;

use crate as pallet_venue_adapter;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, ConstU128, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};

type Block = frame_system::mocking::MockBlock<Test>;

// Integration harness: the adapter's callbacks land in a real basket manager, and
// the basket manager submits its orders back through the adapter.
construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    BasketManager: pallet_basket_manager,
    VenueAdapter: pallet_venue_adapter,
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

pub struct BasketPalletId;
impl Get<PalletId> for BasketPalletId {
  fn get() -> PalletId {
    PalletId(*primitives::pallet_ids::BASKET_MANAGER_PALLET_ID)
  }
}

impl pallet_basket_manager::Config for Test {
  type Assets = Assets;
  type Currency = Balances;
  type Venue = VenueAdapter;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type KeeperOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type PalletId = BasketPalletId;
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

pub struct VenuePalletId;
impl Get<PalletId> for VenuePalletId {
  fn get() -> PalletId {
    PalletId(*primitives::pallet_ids::VENUE_ADAPTER_PALLET_ID)
  }
}

impl pallet_venue_adapter::Config for Test {
  type Assets = Assets;
  type Currency = Balances;
  type CallbackHandler = BasketManager;
  type KeeperOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type PalletId = VenuePalletId;
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
    accounts: alloc::vec![(USDC, ALICE, 1_000_000_000_000)],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_basket_manager::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  pallet_venue_adapter::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| frame_system::Pallet::<Test>::set_block_number(1));
  ext
}
