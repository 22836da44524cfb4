use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    DepositAnnulledEvent,
    DepositApprovedEvent,
    DepositCreatedEvent,
    EventHandler,
    EventProducer,
    Handler,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub deposit_created_producer: Vec<EventProducer<DepositCreatedEvent>>,
    pub deposit_approved_producer: Vec<EventProducer<DepositApprovedEvent>>,
    pub deposit_annulled_producer: Vec<EventProducer<DepositAnnulledEvent>>,
}

pub struct EventHandlers {
    pub on_deposit_created: Option<EventHandler<DepositCreatedEvent>>,
    pub on_deposit_approved: Option<EventHandler<DepositApprovedEvent>>,
    pub on_deposit_annulled: Option<EventHandler<DepositAnnulledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_deposit_created = hooks.on_deposit_created.map(|f| EventHandler::new(buffer_size, f));
        let on_deposit_approved = hooks.on_deposit_approved.map(|f| EventHandler::new(buffer_size, f));
        let on_deposit_annulled = hooks.on_deposit_annulled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_deposit_created, on_deposit_approved, on_deposit_annulled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_deposit_created {
            result.deposit_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_deposit_approved {
            result.deposit_approved_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_deposit_annulled {
            result.deposit_annulled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_deposit_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_deposit_approved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_deposit_annulled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_deposit_created: Option<Handler<DepositCreatedEvent>>,
    pub on_deposit_approved: Option<Handler<DepositApprovedEvent>>,
    pub on_deposit_annulled: Option<Handler<DepositAnnulledEvent>>,
}

impl EventHooks {
    pub fn on_deposit_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DepositCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_deposit_created = Some(Arc::new(f));
        self
    }

    pub fn on_deposit_approved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DepositApprovedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_deposit_approved = Some(Arc::new(f));
        self
    }

    pub fn on_deposit_annulled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DepositAnnulledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_deposit_annulled = Some(Arc::new(f));
        self
    }
}
