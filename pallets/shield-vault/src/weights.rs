#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn create_mint_intent() -> Weight;
	fn execute_mint_intent() -> Weight;
	fn cancel_mint_intent() -> Weight;
	fn refund_mint_intent() -> Weight;
	fn create_redeem_intent() -> Weight;
	fn execute_redeem_intent() -> Weight;
	fn complete_redeem_intent() -> Weight;
	fn cancel_redeem_intent() -> Weight;
	fn refund_redeem_intent() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn create_mint_intent() -> Weight {
		Weight::from_parts(90_000_000, 9000)
			.saturating_add(T::DbWeight::get().reads(8))
			.saturating_add(T::DbWeight::get().writes(8))
	}
	fn execute_mint_intent() -> Weight {
		Weight::from_parts(70_000_000, 7000)
			.saturating_add(T::DbWeight::get().reads(5))
			.saturating_add(T::DbWeight::get().writes(5))
	}
	fn cancel_mint_intent() -> Weight {
		Weight::from_parts(70_000_000, 7000)
			.saturating_add(T::DbWeight::get().reads(5))
			.saturating_add(T::DbWeight::get().writes(5))
	}
	fn refund_mint_intent() -> Weight {
		Weight::from_parts(70_000_000, 7000)
			.saturating_add(T::DbWeight::get().reads(5))
			.saturating_add(T::DbWeight::get().writes(5))
	}
	fn create_redeem_intent() -> Weight {
		Weight::from_parts(90_000_000, 9000)
			.saturating_add(T::DbWeight::get().reads(9))
			.saturating_add(T::DbWeight::get().writes(8))
	}
	fn execute_redeem_intent() -> Weight {
		Weight::from_parts(100_000_000, 10000)
			.saturating_add(T::DbWeight::get().reads(9))
			.saturating_add(T::DbWeight::get().writes(9))
	}
	fn complete_redeem_intent() -> Weight {
		Weight::from_parts(80_000_000, 8000)
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().writes(6))
	}
	fn cancel_redeem_intent() -> Weight {
		Weight::from_parts(50_000_000, 5000)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(4))
	}
	fn refund_redeem_intent() -> Weight {
		Weight::from_parts(80_000_000, 8000)
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().writes(6))
	}
}

impl WeightInfo for () {
	fn create_mint_intent() -> Weight {
		Weight::from_parts(90_000_000, 9000)
	}
	fn execute_mint_intent() -> Weight {
		Weight::from_parts(70_000_000, 7000)
	}
	fn cancel_mint_intent() -> Weight {
		Weight::from_parts(70_000_000, 7000)
	}
	fn refund_mint_intent() -> Weight {
		Weight::from_parts(70_000_000, 7000)
	}
	fn create_redeem_intent() -> Weight {
		Weight::from_parts(90_000_000, 9000)
	}
	fn execute_redeem_intent() -> Weight {
		Weight::from_parts(100_000_000, 10000)
	}
	fn complete_redeem_intent() -> Weight {
		Weight::from_parts(80_000_000, 8000)
	}
	fn cancel_redeem_intent() -> Weight {
		Weight::from_parts(50_000_000, 5000)
	}
	fn refund_redeem_intent() -> Weight {
		Weight::from_parts(80_000_000, 8000)
	}
}
