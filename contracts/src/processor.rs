//! # Signed Instruction Processing
//!
//! The wire-shaped entry point. A caller pairs an [`Instruction`] with a
//! nonce, signs the bincode encoding of the pair through
//! [`Signer::sign_message`] and submits a [`SignedInstruction`].
//! [`Ledger::process`] verifies the signature, which is the only way to
//! obtain a [`Signer`] from outside the process, checks the nonce,
//! dispatches to the matching operation and returns a [`Receipt`].
//!
//! ## Replay
//!
//! Each signer's nonces must strictly increase. Gaps are allowed. Once an
//! instruction is authenticated its nonce is consumed, even if the operation
//! itself is then rejected, so a signed instruction is attempted at most
//! once. Resubmitting it fails with `Conflict`.
//!
//! A bad signature is rejected as `Unauthorized` before any record is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vaultline_protocol::crypto::hash::sha256;
use vaultline_protocol::crypto::keys::{Keypair, PublicKey, Signature};
use vaultline_protocol::identity::{Address, Signer};
use vaultline_protocol::token::AssetLedger;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::state::GlobalState;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// One request to the ledger. The signer is carried alongside, not inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Initialize {
        reserve_asset: Address,
    },
    OpenVault {
        vault: Address,
        positions: Address,
    },
    /// `salt: None` opens the default branch.
    OpenBranch {
        vault: Address,
        salt: Option<u64>,
    },
    IndexBranch {
        vault: Address,
        branch: Address,
    },
    CloseBranch {
        vault: Address,
        branch: Address,
    },
    Pay {
        amount: u64,
        vault: Address,
        branch: Address,
        recipient: Address,
    },
    Swap {
        amount: u64,
        settle: Address,
        recipient: Address,
    },
}

impl Instruction {
    /// The message a signer signs for this instruction under `nonce`.
    pub fn signing_bytes(&self, nonce: u64) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&(self, nonce))
    }

    /// Operation name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Initialize { .. } => "initialize",
            Instruction::OpenVault { .. } => "open_vault",
            Instruction::OpenBranch { salt: None, .. } => "open_branch",
            Instruction::OpenBranch { salt: Some(_), .. } => "open_branch_with_salt",
            Instruction::IndexBranch { .. } => "index_branch",
            Instruction::CloseBranch { .. } => "close_branch",
            Instruction::Pay { .. } => "pay",
            Instruction::Swap { .. } => "swap",
        }
    }
}

/// An instruction plus the Ed25519 signature authorizing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInstruction {
    pub instruction: Instruction,
    /// Must exceed the last nonce the ledger accepted from this signer.
    pub nonce: u64,
    pub signer: PublicKey,
    pub signature: Signature,
}

impl SignedInstruction {
    /// Sign `instruction` under `nonce` with `keypair`.
    pub fn sign(
        instruction: Instruction,
        nonce: u64,
        keypair: &Keypair,
    ) -> Result<Self, bincode::Error> {
        let bytes = instruction.signing_bytes(nonce)?;
        Ok(Self {
            signature: Signer::sign_message(keypair, &bytes),
            signer: keypair.public_key(),
            instruction,
            nonce,
        })
    }

    /// Hex SHA-256 of the signed bytes.
    pub fn id(&self) -> Result<String, bincode::Error> {
        Ok(hex::encode(sha256(&self.instruction.signing_bytes(self.nonce)?)))
    }

    /// Check the signature and return the authenticated signer.
    pub fn authenticate(&self) -> LedgerResult<Signer> {
        let signer_address = Address::from_public_key(&self.signer);
        let bytes = self.instruction.signing_bytes(self.nonce).map_err(|_| {
            LedgerError::unauthorized(signer_address, "submit an unencodable instruction")
        })?;
        Signer::verify(&self.signer, &bytes, &self.signature)
            .map_err(|_| LedgerError::unauthorized(signer_address, "submit with a bad signature"))
    }
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// What an instruction did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Initialized(GlobalState),
    VaultOpened {
        vault: Address,
        positions: Address,
    },
    BranchOpened {
        branch: Address,
        capability: Address,
        holder_account: Address,
    },
    BranchIndexed {
        vault: Address,
        branch: Address,
    },
    BranchClosed {
        vault: Address,
        branch: Address,
    },
    Paid {
        amount: u64,
        vault_balance: u64,
        branch_balance: u64,
        recipient_balance: u64,
    },
    Swapped {
        amount: u64,
        settle_balance: u64,
        controller_balance: u64,
        recipient_balance: u64,
    },
}

/// Proof of processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hex SHA-256 of the signed instruction bytes.
    pub instruction_id: String,
    pub signer: Address,
    pub nonce: u64,
    pub outcome: Outcome,
    /// Position of this instruction in the ledger's history, starting at 1.
    pub sequence: u64,
    pub processed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl<L: AssetLedger> Ledger<L> {
    /// Authenticate and apply one signed instruction.
    pub fn process(&mut self, signed: &SignedInstruction) -> LedgerResult<Receipt> {
        let signer = match signed.authenticate() {
            Ok(signer) => signer,
            Err(err) => {
                warn!(
                    instruction = signed.instruction.name(),
                    signer = %signed.signer,
                    "signature rejected"
                );
                return Err(err);
            }
        };
        let signer_address = signer.address();
        let instruction_id = signed
            .id()
            .map_err(|_| LedgerError::unauthorized(signer_address, "submit an unencodable instruction"))?;

        let last = self.last_nonce(&signer_address).unwrap_or(0);
        if signed.nonce <= last {
            warn!(
                instruction = signed.instruction.name(),
                signer = %signer_address,
                nonce = signed.nonce,
                last,
                "stale nonce rejected"
            );
            return Err(LedgerError::conflict(signer_address, "nonce already used"));
        }
        self.nonces.insert(signer_address, signed.nonce);

        let outcome = self.dispatch(&signer, &signed.instruction)?;

        self.processed += 1;
        debug!(
            id = %instruction_id,
            instruction = signed.instruction.name(),
            sequence = self.processed,
            "instruction processed"
        );
        Ok(Receipt {
            instruction_id,
            signer: signer_address,
            nonce: signed.nonce,
            outcome,
            sequence: self.processed,
            processed_at: Utc::now(),
        })
    }

    fn dispatch(&mut self, signer: &Signer, instruction: &Instruction) -> LedgerResult<Outcome> {
        match *instruction {
            Instruction::Initialize { reserve_asset } => self
                .initialize(signer, &reserve_asset)
                .map(Outcome::Initialized),
            Instruction::OpenVault { vault, positions } => {
                self.open_vault(signer, &vault, &positions)?;
                Ok(Outcome::VaultOpened { vault, positions })
            }
            Instruction::OpenBranch { vault, salt } => {
                let opened = match salt {
                    None => self.open_branch(signer, &vault)?,
                    Some(salt) => self.open_branch_with_salt(signer, &vault, salt)?,
                };
                Ok(Outcome::BranchOpened {
                    branch: opened.branch,
                    capability: opened.capability,
                    holder_account: opened.holder_account,
                })
            }
            Instruction::IndexBranch { vault, branch } => {
                self.index_branch(signer, &vault, &branch)?;
                Ok(Outcome::BranchIndexed { vault, branch })
            }
            Instruction::CloseBranch { vault, branch } => {
                self.close_branch(signer, &vault, &branch)?;
                Ok(Outcome::BranchClosed { vault, branch })
            }
            Instruction::Pay {
                amount,
                vault,
                branch,
                recipient,
            } => {
                let paid = self.pay(amount, signer, &vault, &branch, &recipient)?;
                Ok(Outcome::Paid {
                    amount: paid.amount,
                    vault_balance: paid.vault_balance,
                    branch_balance: paid.branch_balance,
                    recipient_balance: paid.recipient_balance,
                })
            }
            Instruction::Swap {
                amount,
                settle,
                recipient,
            } => {
                let swapped = self.swap(amount, signer, &settle, &recipient)?;
                Ok(Outcome::Swapped {
                    amount: swapped.amount,
                    settle_balance: swapped.settle_balance,
                    controller_balance: swapped.controller_balance,
                    recipient_balance: swapped.recipient_balance,
                })
            }
        }
    }
}
