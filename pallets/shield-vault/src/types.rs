use frame::deps::frame_support::pallet_prelude::*;

pub type Balance = u128;
pub type DepositId = u64;
pub type WithdrawalId = u64;

/// Lifecycle of an intent. Transitions are strictly forward; the three terminal
/// states are immutable once reached.
///
/// `Processing` only occurs on the redeem side, while a queued liquidation is
/// awaiting venue settlement.
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
pub enum IntentStatus {
  Pending,
  Processing,
  Completed,
  Refunded,
  Cancelled,
}

impl IntentStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      IntentStatus::Completed | IntentStatus::Refunded | IntentStatus::Cancelled
    )
  }
}

/// A deposit waiting for executor settlement.
///
/// The stablecoin principal is already forwarded into basket reserves at creation;
/// `deposit_id` links back to the deployment record so a refund can claw it out.
#[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct MintIntent<AccountId, BlockNumber> {
  pub user: AccountId,
  /// Reserve stablecoin the deposit was made in
  pub asset: u32,
  /// Principal in asset units
  pub amount: Balance,
  /// Principal normalized to 18-decimal USD
  pub amount_usd: Balance,
  /// NAV per share locked at creation
  pub locked_nav: Balance,
  /// Native escrowed to compensate the executor
  pub execution_fee: Balance,
  /// Deployment record created when the principal entered reserves
  pub deposit_id: DepositId,
  /// Withdrawal record created if the principal was refunded out of reserves
  pub refund_id: Option<WithdrawalId>,
  pub created_at: BlockNumber,
  pub expires_at: BlockNumber,
  pub status: IntentStatus,
  /// Shares actually minted to the user, set on completion
  pub actual_shares: Balance,
  /// NAV the settlement was priced at, set on completion
  pub final_nav: Balance,
}

/// A redemption waiting for executor settlement. Shares sit escrowed in the vault
/// account from creation until burn or return.
#[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct RedeemIntent<AccountId, BlockNumber> {
  pub user: AccountId,
  /// Reserve stablecoin the payout is owed in
  pub asset: u32,
  /// Escrowed shares, gross of the redeem fee
  pub shares: Balance,
  pub locked_nav: Balance,
  pub execution_fee: Balance,
  /// Set when the payout needed liquidation and went through the pending queue
  pub withdrawal_id: Option<WithdrawalId>,
  /// Owed payout in asset units, set at execution
  pub payout_amount: Balance,
  pub created_at: BlockNumber,
  pub expires_at: BlockNumber,
  pub status: IntentStatus,
  pub final_nav: Balance,
}
