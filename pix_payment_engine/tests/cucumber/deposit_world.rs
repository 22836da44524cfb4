use std::{collections::HashMap, sync::Arc};

use cucumber::World;
use log::*;
use pix_payment_engine::{
    events::EventProducers,
    test_utils::ScriptedProcessor,
    DepositFlowApi,
    DepositFlowError,
    DepositOptions,
    DepositReceipt,
    MemoryDatabase,
};

#[derive(Default, Debug, World)]
pub struct DepositWorld {
    pub system: Option<DepositSystem>,
    /// Receipts of successful deposit requests, by the label the scenario gave them
    pub deposits: HashMap<String, DepositReceipt>,
    pub last_error: Option<DepositFlowError>,
}

#[derive(Debug)]
pub struct DepositSystem {
    pub db: MemoryDatabase,
    pub processor: ScriptedProcessor,
    pub api: Arc<DepositFlowApi<MemoryDatabase, ScriptedProcessor>>,
}

impl DepositWorld {
    pub fn system(&self) -> &DepositSystem {
        self.system.as_ref().expect("Deposit system not initialised")
    }

    pub fn api(&self) -> &DepositFlowApi<MemoryDatabase, ScriptedProcessor> {
        &self.system().api
    }

    pub fn deposit(&self, label: &str) -> &DepositReceipt {
        self.deposits.get(label).unwrap_or_else(|| panic!("No deposit labelled '{label}'"))
    }
}

impl DepositSystem {
    pub fn new(options: DepositOptions) -> Self {
        let db = MemoryDatabase::new();
        let processor = ScriptedProcessor::new();
        let api = DepositFlowApi::new(db.clone(), processor.clone(), EventProducers::default(), options);
        debug!("🚀️ New deposit system created");
        Self { db, processor, api: Arc::new(api) }
    }
}
