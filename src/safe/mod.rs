//! Safe account orchestrator
//!
//! Ties the pieces together for one account: standardize a request,
//! hash it on-chain, collect owner signatures, merge on-chain
//! approvals, and execute once the threshold gate passes. Every
//! network call is a suspension point; only independent reads are ever
//! issued concurrently.

use crate::config::{validate_version, Network};
use crate::contract::SafeContract;
use crate::error::{SafeError, SafeResult};
use crate::logging;
use crate::provider::{CallRequest, Provider};
use crate::relay::{ProposeTransactionBody, ServiceTransaction, TransactionService};
use crate::signature::{adjust_v, is_signed_with_prefix, pre_validated_signature, SafeSignature};
use crate::tx::{standardize, SafeTransaction};
use crate::types::{
    BasicSafeInfo, ExecutionOptions, ExecutionResult, SafeInfo, TransactionRequest,
};
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Bytes, TransactionRequest as EthTransactionRequest, H256, U256};
use ethers_core::utils::{hash_message, to_checksum};
use ethers_signers::{LocalWallet, Signer};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Confirmation state of an off-chain message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Confirmed,
    PendingSignatures,
}

/// Outcome of posting an off-chain message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResult {
    pub message_hash: H256,
    pub status: MessageStatus,
}

/// One Safe account and its collaborators
pub struct Safe {
    address: Address,
    version: Version,
    network: Network,
    provider: Arc<dyn Provider>,
    contract: SafeContract,
    service: TransactionService,
}

impl std::fmt::Debug for Safe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Safe")
            .field("address", &self.address)
            .field("version", &self.version)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl Safe {
    /// Build an orchestrator for `address` on `network`
    ///
    /// The version string and network are validated here; an unknown
    /// combination is a configuration error, not a latent runtime one.
    pub fn new(
        address: Address,
        version: &str,
        network: Network,
        provider: Arc<dyn Provider>,
    ) -> SafeResult<Self> {
        let service = TransactionService::new(network)?;
        Self::with_service(address, version, network, provider, service)
    }

    /// Same as [`Safe::new`] with an explicit service client, for
    /// self-hosted relays
    pub fn with_service(
        address: Address,
        version: &str,
        network: Network,
        provider: Arc<dyn Provider>,
        service: TransactionService,
    ) -> SafeResult<Self> {
        let version = validate_version(version)?;
        let contract = SafeContract::new(address, provider.clone());
        Ok(Self {
            address,
            version,
            network,
            provider,
            contract,
            service,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Read the account's on-chain version string
    pub async fn fetch_version(provider: Arc<dyn Provider>, address: Address) -> SafeResult<String> {
        SafeContract::new(address, provider).version().await
    }

    /// Check a relay-reported info record against this configuration
    pub fn verify_info(&self, info: &SafeInfo) -> SafeResult<()> {
        let reported = validate_version(&info.version)?;
        if reported != self.version {
            return Err(SafeError::configuration(format!(
                "Current version {} not matched address version {}",
                self.version, info.version
            )));
        }
        Ok(())
    }

    pub async fn get_owners(&self) -> SafeResult<Vec<Address>> {
        self.contract.get_owners().await
    }

    pub async fn get_threshold(&self) -> SafeResult<U256> {
        self.contract.get_threshold().await
    }

    pub async fn get_nonce(&self) -> SafeResult<U256> {
        self.contract.nonce().await
    }

    pub async fn is_owner(&self, address: Address) -> SafeResult<bool> {
        Ok(self.get_owners().await?.contains(&address))
    }

    pub async fn get_balance(&self) -> SafeResult<U256> {
        self.provider.balance_of(self.address).await
    }

    /// Account summary; the three reads are independent and issued
    /// concurrently
    pub async fn get_basic_info(&self) -> SafeResult<BasicSafeInfo> {
        let (threshold, nonce, owners) =
            tokio::try_join!(self.get_threshold(), self.get_nonce(), self.get_owners())?;
        Ok(BasicSafeInfo {
            address: self.address,
            version: self.version.to_string(),
            threshold,
            nonce,
            owners,
        })
    }

    /// Full account record from the transaction service
    pub async fn get_safe_info(&self) -> SafeResult<SafeInfo> {
        self.service.get_safe_info(self.address).await
    }

    /// Unexecuted service transactions from the current nonce upward
    pub async fn get_pending_transactions(&self) -> SafeResult<Vec<ServiceTransaction>> {
        let nonce = self.get_nonce().await?;
        self.service.get_pending_transactions(self.address, nonce).await
    }

    /// Standardize a partial request into a canonical transaction
    pub async fn build_transaction(
        &self,
        request: TransactionRequest,
    ) -> SafeResult<SafeTransaction> {
        standardize(
            request,
            &self.contract,
            self.provider.as_ref(),
            &self.service,
            &self.version,
        )
        .await
    }

    /// Canonical transaction hash from the contract
    pub async fn transaction_hash(&self, tx: &SafeTransaction) -> SafeResult<H256> {
        self.contract.get_transaction_hash(&tx.data).await
    }

    /// Sign a transaction hash with an owner key
    pub async fn sign_transaction_hash(
        &self,
        signer: &LocalWallet,
        hash: H256,
    ) -> SafeResult<SafeSignature> {
        self.require_owner(signer.address()).await?;
        self.sign_digest(signer, hash).await
    }

    /// Hash a transaction and attach the signer's signature
    pub async fn sign_transaction(
        &self,
        signer: &LocalWallet,
        tx: &mut SafeTransaction,
    ) -> SafeResult<()> {
        let hash = self.transaction_hash(tx).await?;
        let signature = self.sign_transaction_hash(signer, hash).await?;
        tx.add_signature(signature);
        Ok(())
    }

    /// Sign a pending transaction and record the confirmation with the
    /// service
    pub async fn confirm_transaction(
        &self,
        signer: &LocalWallet,
        tx: &mut SafeTransaction,
    ) -> SafeResult<()> {
        let hash = self.transaction_hash(tx).await?;
        let signature = self.sign_transaction_hash(signer, hash).await?;
        tx.add_signature(signature.clone());
        self.service.confirm_transaction(hash, &signature.data).await?;
        logging::info("safe", "Confirmation recorded")
            .address_field("safe", to_checksum(&self.address, None))
            .address_field("hash", format!("0x{}", hex::encode(hash)))
            .log();
        Ok(())
    }

    /// Propose a transaction to the service so other owners can confirm
    pub async fn propose_transaction(
        &self,
        tx: &SafeTransaction,
        hash: H256,
        sender: Address,
    ) -> SafeResult<()> {
        let body = ProposeTransactionBody::from_transaction(
            self.address,
            &tx.data,
            hash,
            sender,
            &tx.encoded_signatures(),
        )?;
        self.service.propose_transaction(self.address, &body).await?;
        logging::info("safe", "Transaction proposed")
            .address_field("safe", to_checksum(&self.address, None))
            .address_field("hash", format!("0x{}", hex::encode(hash)))
            .field("nonce", body.nonce)
            .log();
        Ok(())
    }

    /// Owners that pre-approved `hash` on-chain
    pub async fn owners_who_approved(&self, hash: H256) -> SafeResult<Vec<Address>> {
        let owners = self.get_owners().await?;
        let mut approved = Vec::new();
        for owner in owners {
            if !self.contract.approved_hashes(owner, hash).await?.is_zero() {
                approved.push(owner);
            }
        }
        Ok(approved)
    }

    /// Record an owner's on-chain approval of a transaction hash
    pub async fn approve_hash(
        &self,
        signer: &LocalWallet,
        hash: H256,
        options: &ExecutionOptions,
    ) -> SafeResult<ExecutionResult> {
        self.require_owner(signer.address()).await?;
        let calldata = self.contract.approve_hash_calldata(hash);
        self.submit_call(signer, calldata, options).await
    }

    /// Execute a transaction once its quorum is satisfiable
    ///
    /// Pre-flight, in order: merge on-chain approvals, synthesize the
    /// submitter's own approval, re-check the owner set, threshold
    /// gate, balance check. Then a one-shot gas estimate and submit;
    /// reverts propagate with the node's reason.
    pub async fn execute_transaction(
        &self,
        signer: &LocalWallet,
        tx: &mut SafeTransaction,
        options: &ExecutionOptions,
    ) -> SafeResult<ExecutionResult> {
        match self.execute_inner(signer, tx, options).await {
            Ok(result) => {
                tx.mark_executed();
                Ok(result)
            }
            Err(e) => {
                tx.mark_failed();
                Err(e)
            }
        }
    }

    async fn execute_inner(
        &self,
        signer: &LocalWallet,
        tx: &mut SafeTransaction,
        options: &ExecutionOptions,
    ) -> SafeResult<ExecutionResult> {
        let hash = self.transaction_hash(tx).await?;

        for owner in self.owners_who_approved(hash).await? {
            tx.add_signature(pre_validated_signature(owner));
        }

        let owners = self.get_owners().await?;
        let signer_address = signer.address();
        if owners.contains(&signer_address) && !tx.signatures.contains(signer_address) {
            tx.add_signature(pre_validated_signature(signer_address));
        }

        // Owners may have rotated since signing
        for collected in tx.signatures.signers() {
            if !owners.contains(&collected) {
                return Err(SafeError::not_an_owner(format!(
                    "Signer {} is not a current owner",
                    to_checksum(&collected, None)
                )));
            }
        }

        let threshold = self.get_threshold().await?;
        tx.signatures.require_threshold(threshold)?;

        if !tx.data.value.is_zero() {
            let balance = self.get_balance().await?;
            if tx.data.value > balance {
                return Err(SafeError::insufficient_funds("Not enough Ether funds"));
            }
        }

        let calldata = self
            .contract
            .exec_transaction_calldata(&tx.data, tx.encoded_signatures());
        let result = self.submit_call(signer, calldata, options).await?;
        logging::info("safe", "Transaction executed")
            .address_field("safe", to_checksum(&self.address, None))
            .address_field("hash", format!("0x{}", hex::encode(hash)))
            .field("gas_limit", result.gas_limit)
            .log();
        Ok(result)
    }

    /// Safe-specific hash of an already-hashed message
    pub async fn safe_message_hash(&self, message_hash: H256) -> SafeResult<H256> {
        self.contract.get_message_hash(message_hash).await
    }

    /// Sign an off-chain message attestation with an owner key
    pub async fn sign_message(
        &self,
        signer: &LocalWallet,
        message: &[u8],
    ) -> SafeResult<SafeSignature> {
        self.require_owner(signer.address()).await?;
        let safe_hash = self.safe_message_hash(hash_message(message)).await?;
        self.sign_digest(signer, safe_hash).await
    }

    /// Post an off-chain message to the service and report its state
    pub async fn add_message(
        &self,
        signer: &LocalWallet,
        message: &str,
    ) -> SafeResult<MessageResult> {
        let signature = self.sign_message(signer, message.as_bytes()).await?;
        self.service
            .add_message(self.address, message, &signature.data)
            .await?;

        let message_hash = self
            .safe_message_hash(hash_message(message.as_bytes()))
            .await?;
        let stored = self.service.get_message(message_hash).await?;
        let threshold = self.get_threshold().await?;
        let status = if U256::from(stored.confirmations.len()) >= threshold {
            MessageStatus::Confirmed
        } else {
            MessageStatus::PendingSignatures
        };
        Ok(MessageResult { message_hash, status })
    }

    async fn require_owner(&self, address: Address) -> SafeResult<()> {
        if self.is_owner(address).await? {
            Ok(())
        } else {
            Err(SafeError::not_an_owner(
                "Transactions can only be signed by Safe owners",
            ))
        }
    }

    /// Request a message signature over `digest` and normalize the
    /// recovery byte for the on-chain verifier
    async fn sign_digest(&self, signer: &LocalWallet, digest: H256) -> SafeResult<SafeSignature> {
        let signature = signer
            .sign_message(digest.as_bytes())
            .await
            .map_err(|e| SafeError::signing_failed(e.to_string()))?;
        let raw = signature.to_vec();
        let prefixed = is_signed_with_prefix(digest, &raw, signer.address());
        let adjusted = adjust_v(&raw, prefixed)?;
        Ok(SafeSignature::eth_sign(signer.address(), adjusted))
    }

    /// Estimate and submit one signed call from the signer's account
    async fn submit_call(
        &self,
        signer: &LocalWallet,
        calldata: Bytes,
        options: &ExecutionOptions,
    ) -> SafeResult<ExecutionResult> {
        let signer_address = signer.address();
        let estimate_request = CallRequest {
            from: Some(signer_address),
            to: self.address,
            data: Some(calldata.clone()),
            ..Default::default()
        };
        let gas_limit = self.provider.estimate_gas(&estimate_request).await?;

        let nonce = self.provider.transaction_count(signer_address).await?;
        let gas_price = match options.gas_price {
            Some(price) => price,
            None => self.provider.gas_price().await?,
        };

        let chain_id = self.network.chain_id();
        let outer = EthTransactionRequest::new()
            .to(self.address)
            .value(U256::zero())
            .data(calldata)
            .gas(gas_limit)
            .gas_price(gas_price)
            .nonce(nonce)
            .chain_id(chain_id);
        let typed: TypedTransaction = outer.into();

        let signer = signer.clone().with_chain_id(chain_id);
        let signature = signer
            .sign_transaction(&typed)
            .await
            .map_err(|e| SafeError::signing_failed(e.to_string()))?;
        let raw = typed.rlp_signed(&signature);

        let transaction_hash = self.provider.send_raw_transaction(raw).await?;
        Ok(ExecutionResult { transaction_hash, gas_limit })
    }
}
