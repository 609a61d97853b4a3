#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn add_reserve_asset() -> Weight;
	fn set_reserve_asset_active() -> Weight;
	fn add_basket_entry() -> Weight;
	fn set_target_weights() -> Weight;
	fn set_basket_entry_active() -> Weight;
	fn set_rebalance_cooldown() -> Weight;
	fn rebalance_positions() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn add_reserve_asset() -> Weight {
		Weight::from_parts(25_000_000, 2500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn set_reserve_asset_active() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn add_basket_entry() -> Weight {
		Weight::from_parts(25_000_000, 2500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn set_target_weights() -> Weight {
		Weight::from_parts(60_000_000, 6000)
			.saturating_add(T::DbWeight::get().reads(8))
			.saturating_add(T::DbWeight::get().writes(8))
	}
	fn set_basket_entry_active() -> Weight {
		Weight::from_parts(20_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn set_rebalance_cooldown() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn rebalance_positions() -> Weight {
		Weight::from_parts(150_000_000, 12000)
			.saturating_add(T::DbWeight::get().reads(16))
			.saturating_add(T::DbWeight::get().writes(16))
	}
}

impl WeightInfo for () {
	fn add_reserve_asset() -> Weight {
		Weight::from_parts(25_000_000, 2500)
	}
	fn set_reserve_asset_active() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn add_basket_entry() -> Weight {
		Weight::from_parts(25_000_000, 2500)
	}
	fn set_target_weights() -> Weight {
		Weight::from_parts(60_000_000, 6000)
	}
	fn set_basket_entry_active() -> Weight {
		Weight::from_parts(20_000_000, 2000)
	}
	fn set_rebalance_cooldown() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
	fn rebalance_positions() -> Weight {
		Weight::from_parts(150_000_000, 12000)
	}
}
