use std::fs;
use async_trait::async_trait;
use tracing::{debug, info, instrument};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection, Database, bson::{Document, doc}, options::ClientOptions};
use crate::db::{AccountStore, prelude::*};
use crate::model::account::{Account, normalise_email};
use crate::utils::{config::Configuration, errors::{ErrorCode, GatekeeperError}, logging::APP_NAME};

///
/// A MongoDB backed account store. Construct one with `connect` and hand it to the service - there
/// is no process-wide connection.
///
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    ///
    /// Connect to MongoDB, check it's reachable and ensure the account indexes exist.
    ///
    pub async fn connect(config: &Configuration) -> Result<Self, GatekeeperError> {
        let db = get_mongo_db(APP_NAME, config).await?;
        create_indexes(&db).await?;
        Ok(MongoStore { db })
    }

    fn accounts(&self) -> Collection<Account> {
        self.db.collection::<Account>(ACCOUNTS)
    }

    async fn find_one(&self, filter: Document) -> Result<Account, GatekeeperError> {
        match self.accounts().find_one(filter, None).await? {
            Some(account) => Ok(account),
            None => Err(ErrorCode::AccountNotFound.with_msg("The account requested does not exist")),
        }
    }
}

#[async_trait]
impl AccountStore for MongoStore {
    #[instrument(skip(self))]
    async fn load(&self, account_id: &str) -> Result<Account, GatekeeperError> {
        self.find_one(doc!{ ACCOUNT_ID: account_id }).await
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Account, GatekeeperError> {
        self.find_one(doc!{ EMAIL: normalise_email(email) }).await
    }

    #[instrument(skip(self, account), fields(account_id = %account.account_id))]
    async fn insert(&self, account: &Account) -> Result<(), GatekeeperError> {
        match self.accounts().insert_one(account, None).await {
            Ok(_) => Ok(()),
            Err(err) => match is_duplicate_err(&err) {
                true  => Err(ErrorCode::DuplicateAccount.with_msg("An account with that id or email already exists")),
                false => Err(GatekeeperError::from(err)),
            },
        }
    }

    #[instrument(skip(self, account), fields(account_id = %account.account_id, version = account.version))]
    async fn replace(&self, account: &Account) -> Result<Account, GatekeeperError> {
        // Only replace the document we read - if someone else has written it since, nothing matches.
        let filter = doc!{
            ACCOUNT_ID: account.account_id.clone(),
            VERSION: account.version as i64,
        };

        let mut updated = account.clone();
        updated.version += 1;

        let result = self.accounts().replace_one(filter, &updated, None).await?;

        if result.matched_count == 0 {
            // Distinguish a lost race from a missing account.
            self.load(&account.account_id).await?;

            return Err(ErrorCode::ConcurrentModification
                .with_msg(&format!("Account {} was modified by another request", account.account_id)))
        }

        Ok(updated)
    }

    async fn close(&self) -> Result<(), GatekeeperError> {
        // The driver returns pooled connections when the last client handle is dropped.
        info!("Closing MongoDB account store");
        Ok(())
    }
}

async fn create_indexes(db: &Database) -> Result<(), GatekeeperError> {
    // Note: the current driver doesn't yet support creating indexes on collections, so the dbcommand must be used instead.
    // https://docs.mongodb.com/manual/reference/command/createIndexes/#createindexes

    db.run_command(doc! { "createIndexes": ACCOUNTS, "indexes": [
        { "key": { ACCOUNT_ID: 1 }, "name": "idx_account_id", "unique": true },
        { "key": { EMAIL: 1 }, "name": "idx_email", "unique": true }] }, None).await?;

    Ok(())
}

///
/// Indicates if the MongoDB error is from a duplicate key violation.
///
pub fn is_duplicate_err(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) => we.code == 11000, /* Duplicate insert */
        _ => false,
    }
}

pub async fn get_mongo_db(app_name: &str, config: &Configuration) -> Result<Database, GatekeeperError> {

    let uri = match &config.mongo_credentials {
        Some(filename) => {
            debug!("Loading MongoDB credentials from secrets file {}", filename);

            // Read username and password from a secrets file.
            let credentials = fs::read_to_string(filename)
                .map_err(|err| ErrorCode::UnableToReadCredentials.with_msg(&format!("Unable to read credentials from {}: {}", filename, err)))?;
            let mut credentials = credentials.lines();
            let uri = config.mongo_uri.replace("$USERNAME", credentials.next().unwrap_or_default());
            uri.replace("$PASSWORD", credentials.next().unwrap_or_default())
        },
        None => config.mongo_uri.clone(),
    };

    // Parse the uri now.
    let mut client_options = ClientOptions::parse(&uri).await?;

    // Manually set an option.
    client_options.app_name = Some(app_name.to_string());

    // Get a handle to the deployment.
    let client = Client::with_options(client_options)?;

    info!("Connecting to MongoDB...");

    let db = client.database(&config.db_name);
    ping(&db).await?;

    info!("Connected to MongoDB");
    Ok(db)
}

pub async fn ping(db: &Database) -> Result<Document, GatekeeperError> {
    Ok(db.run_command(doc! { "ping": 1 }, None).await?)
}
