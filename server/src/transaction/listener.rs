use super::transaction::TransactionInfo;

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Hooks run around every transaction of the session they are registered on.
/// Start hooks run in registration order, end hooks in reverse.
pub trait TransactionListener: Send + Sync {
    fn transaction_start(&self, transaction: &TransactionInfo) -> Result<(), ListenerError> {
        let _ = transaction;
        Ok(())
    }

    fn transaction_end(&self, transaction: &TransactionInfo) -> Result<(), ListenerError> {
        let _ = transaction;
        Ok(())
    }

    /// Name used when reporting a failure of this listener
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
