use mockall::mock;
use pix_payment_engine::{
    db_types::ProcessorId,
    traits::{NewCharge, PaymentProcessor, ProcessorCharge, ProcessorError},
};

mock! {
    pub Processor {}
    impl PaymentProcessor for Processor {
        async fn create_charge(&self, charge: NewCharge) -> Result<ProcessorCharge, ProcessorError>;
        async fn fetch_charge(&self, id: &ProcessorId) -> Result<ProcessorCharge, ProcessorError>;
    }
}
