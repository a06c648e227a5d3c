//! High-level facade: one built configuration, one staged transaction.

use tracing::debug;

use crate::{
    adapter::{ProtocolAdapter, UNBUILT_CONFIGURATION, UNBUILT_TRANSACTION},
    config::Configuration,
    error::{GatewayError, Result},
    transaction::Transaction,
};

const NO_TRANSACTION: &str = "Cannot submit transaction - No transaction has been built";

/// Gateway client holding a built [`Configuration`] and at most one staged
/// [`Transaction`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use iveri_gateway::{
///     IveriGateway,
///     config::Configuration,
///     transaction::{NoopListener, Transaction},
/// };
/// use rust_decimal::Decimal;
///
/// # async fn example() -> iveri_gateway::error::Result<()> {
/// let config = Configuration::from_file("iveri.toml")?.build()?;
/// let mut gateway = IveriGateway::new(config)?;
///
/// let lookup = Transaction::lookup(Arc::new(NoopListener))
///     .with_amount(Decimal::new(1_000, 2))
///     .with_currency("ZAR")
///     .with_pan_number("4111111111111111")
///     .with_pan_expiry(6, 2030)
///     .with_reference("order-9")
///     .build()?;
///
/// gateway.set_transaction(lookup)?;
/// let lookup = gateway.submit_transaction().await?;
/// println!("enrolled: {}", lookup.is_three_d_secured());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IveriGateway {
    config: Configuration,
    adapter: ProtocolAdapter,
    transaction: Option<Transaction>,
}

impl IveriGateway {
    /// Creates a gateway for a built configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Precondition`] if `config` is not built, or an HTTP client
    /// setup error.
    pub fn new(config: Configuration) -> Result<Self> {
        ensure_built(&config)?;
        let adapter = ProtocolAdapter::for_configuration(&config)?;
        Ok(Self { config, adapter, transaction: None })
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Precondition`] if `config` is not built. The previous
    /// configuration is kept in that case.
    pub fn set_configuration(&mut self, config: Configuration) -> Result<()> {
        ensure_built(&config)?;
        self.adapter = ProtocolAdapter::for_configuration(&config)?;
        self.config = config;
        Ok(())
    }

    /// Stages a transaction for the next [`submit_transaction`](Self::submit_transaction),
    /// replacing any staged one.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Precondition`] if `transaction` is not built.
    pub fn set_transaction(&mut self, transaction: Transaction) -> Result<()> {
        if !transaction.is_built() {
            return Err(GatewayError::Precondition(UNBUILT_TRANSACTION.to_owned()));
        }
        debug!(transaction_id = %transaction.id(), "transaction staged");
        self.transaction = Some(transaction);
        Ok(())
    }

    /// Submits the staged transaction and returns it with its result attached.
    ///
    /// The transaction stays staged; submitting again overwrites its result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Precondition`] if no transaction is staged.
    pub async fn submit_transaction(&mut self) -> Result<&Transaction> {
        let transaction = self
            .transaction
            .as_mut()
            .ok_or_else(|| GatewayError::Precondition(NO_TRANSACTION.to_owned()))?;
        self.adapter.perform_transaction(&self.config, transaction).await?;
        Ok(&*transaction)
    }

    /// Removes and returns the staged transaction.
    pub fn take_transaction(&mut self) -> Option<Transaction> {
        self.transaction.take()
    }

    /// Staged transaction, if any.
    #[must_use]
    pub const fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// Active configuration.
    #[must_use]
    pub const fn configuration(&self) -> &Configuration {
        &self.config
    }
}

fn ensure_built(config: &Configuration) -> Result<()> {
    if config.is_built() {
        Ok(())
    } else {
        Err(GatewayError::Precondition(UNBUILT_CONFIGURATION.to_owned()))
    }
}
