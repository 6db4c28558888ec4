//! Document fixtures shared by the engine's unit tests

use std::borrow::Cow;
use std::sync::Arc;

use docrepo_core::{Document, ObjectId, Uuid};
use docrepo_storage::MemoryClient;
use serde::{Deserialize, Serialize};

use crate::access::DataAccess;
use crate::config::RepositoryConfig;

/// Unpartitioned, random keys, default collection name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub stars: i64,
}

impl Note {
    pub fn new(text: &str, stars: i64) -> Self {
        Note {
            id: Uuid::nil(),
            text: text.to_string(),
            stars,
        }
    }
}

impl Document for Note {
    type Key = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Partitioned by tenant, time-ordered keys, custom collection name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub tenant: String,
    pub owner: String,
    pub balance: i64,
    pub tier: i32,
}

impl Account {
    pub fn new(tenant: &str, owner: &str, balance: i64, tier: i32) -> Self {
        Account {
            id: ObjectId::from_bytes([0; 12]),
            tenant: tenant.to_string(),
            owner: owner.to_string(),
            balance,
            tier,
        }
    }
}

impl Document for Account {
    type Key = ObjectId;
    const PARTITIONED: bool = true;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    fn partition_key(&self) -> Option<&str> {
        Some(&self.tenant)
    }

    fn collection_name() -> Cow<'static, str> {
        Cow::Borrowed("accounts")
    }
}

/// Caller-supplied string keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub code: String,
    pub open: bool,
}

impl Document for Ticket {
    type Key = String;

    fn id(&self) -> &String {
        &self.code
    }

    fn set_id(&mut self, id: String) {
        self.code = id;
    }
}

pub fn memory_access() -> (Arc<MemoryClient>, Arc<DataAccess>) {
    let client = MemoryClient::shared("test");
    let access = DataAccess::new(client.clone(), RepositoryConfig::for_database("test"));
    (client, Arc::new(access))
}
