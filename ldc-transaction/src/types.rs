use ldc_common::prelude::*;
use ldc_common::serialization::HashCompute;
use ldc_state::{LendingConfig, StakeConfig};
use num_traits::Zero;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// An authorized and costed transaction.
///
/// `signers` and `ex_signers` are the already verified signer sets of the
/// sender side and of the counterparty side.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TxKind,
    pub chain_id: u64,
    pub nonce: u64,
    #[serde(default)]
    pub gas_tip: u64,
    pub gas_fee_cap: u64,
    /// Gas units, computed outside the ledger
    pub gas: u64,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub token: TokenSymbol,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub amount: Option<Amount>,
    /// JSON encoded payload, hex on the wire
    #[serde(default, with = "hex::serde")]
    pub data: Vec<u8>,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub signers: Signers,
    #[serde(default)]
    pub ex_signers: Signers,
}

impl LedgerSerialize for Transaction {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Json
    }
}

impl Transaction {
    pub fn new(kind: TxKind, chain_id: u64, from: Address, nonce: u64) -> Self {
        Self {
            kind,
            chain_id,
            nonce,
            gas_tip: 0,
            gas_fee_cap: 0,
            gas: 0,
            from,
            to: None,
            token: TokenSymbol::NATIVE,
            amount: None,
            data: Vec::new(),
            timestamp: 0,
            signers: Signers::new(vec![from]),
            ex_signers: Signers::default(),
        }
    }

    /// SHA-256 over the JSON encoding.
    pub fn id(&self) -> LedgerResult<[u8; 32]> {
        Ok(HashCompute::hash_data(self)?)
    }

    pub fn id_hex(&self) -> LedgerResult<String> {
        Ok(hex::encode(self.id()?))
    }

    pub fn amount_or_zero(&self) -> Amount {
        self.amount.clone().unwrap_or_default()
    }

    pub fn has_amount(&self) -> bool {
        self.amount.as_ref().is_some_and(|a| !a.is_zero())
    }

    pub fn set_data<T: Serialize>(&mut self, input: &T) -> LedgerResult<()> {
        self.data = serde_json::to_vec(input)?;
        Ok(())
    }

    pub fn decode_data<T: DeserializeOwned>(&self) -> LedgerResult<T> {
        if self.data.is_empty() {
            return Err(LedgerError::validation(format!("{}: missing data", self.kind)));
        }
        serde_json::from_slice(&self.data)
            .map_err(|e| LedgerError::validation(format!("{}: invalid data, {}", self.kind, e)))
    }

    // Builder helpers

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_amount(mut self, token: TokenSymbol, amount: Amount) -> Self {
        self.token = token;
        self.amount = Some(amount);
        self
    }

    pub fn with_token(mut self, token: TokenSymbol) -> Self {
        self.token = token;
        self
    }

    pub fn with_gas(mut self, gas: u64, gas_tip: u64, gas_fee_cap: u64) -> Self {
        self.gas = gas;
        self.gas_tip = gas_tip;
        self.gas_fee_cap = gas_fee_cap;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_signers(mut self, signers: Vec<Address>) -> Self {
        self.signers = Signers::new(signers);
        self
    }

    pub fn with_ex_signers(mut self, signers: Vec<Address>) -> Self {
        self.ex_signers = Signers::new(signers);
        self
    }

    pub fn with_data<T: Serialize>(mut self, input: &T) -> LedgerResult<Self> {
        self.set_data(input)?;
        Ok(self)
    }
}

/// Account settings payload of UpdateAccountInfo and CreateStake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxAccounter {
    pub threshold: Option<u16>,
    pub keepers: Option<Vec<Address>>,
    /// Zero address clears the approver
    pub approver: Option<Address>,
    pub approve_list: Option<Vec<TxKind>>,
    /// Pool parameters, CreateStake only
    pub stake: Option<StakeConfig>,
}

impl TxAccounter {
    pub fn syntactic_verify(&self) -> LedgerResult<()> {
        if let (Some(threshold), Some(keepers)) = (self.threshold, &self.keepers) {
            ValidationUtils::validate_keepers(threshold, keepers)?;
        }
        if let Some(cfg) = &self.stake {
            cfg.syntactic_verify()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeStakeInput {
    /// Entry lock time, 0 for none
    pub lock_time: u64,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawStakeInput {
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStakeApproverInput {
    /// Zero address clears the approver
    pub approver: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceTableInput {
    pub expire: u64,
    pub nonces: Vec<u64>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowInput {
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    #[serde(default)]
    pub due_time: u64,
}

/// Re-exported payload types that live with their sub-ledgers
pub type ResetStakeInput = StakeConfig;
pub type OpenLendingInput = LendingConfig;
