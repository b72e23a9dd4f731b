use mongodb::{Client, Collection, Database};
use std::error::Error;

/// Banco usado quando a URI não traz um nome
const DEFAULT_DB_NAME: &str = "career_service";

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));  // 5min idle

        // Timeouts
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let db_name = client_options
            .default_database
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;
        log::info!("🗄️  Using database '{}'", db_name);

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Cria os índices usados pelas consultas e pelas regras de unicidade
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::{doc, Document};
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = || Some(IndexOptions::builder().unique(true).build());

        // (collection, keys, unique, label)
        let indexes: Vec<(&str, Document, bool, &str)> = vec![
            ("users", doc! { "firebaseUid": 1 }, true, "users(firebaseUid) unique"),
            ("users", doc! { "email": 1 }, true, "users(email) unique"),
            // Chave de deduplicação das vagas importadas
            ("jobs", doc! { "company_name": 1, "job_title": 1, "location": 1 }, true, "jobs(company_name, job_title, location) unique"),
            ("jobs", doc! { "createdAt": -1 }, false, "jobs(createdAt)"),
            ("achievements", doc! { "code": 1 }, true, "achievements(code) unique"),
            ("user_achievements", doc! { "userId": 1, "achievementCode": 1 }, true, "user_achievements(userId, achievementCode) unique"),
            ("roadmaps", doc! { "userId": 1, "jobId": 1 }, true, "roadmaps(userId, jobId) unique"),
        ];

        for (collection, keys, is_unique, label) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(if is_unique { unique() } else { None })
                .build();

            match self.database().collection::<Document>(collection).create_index(model).await {
                Ok(_) => log::info!("   ✅ Index created: {}", label),
                Err(e) => log::warn!("   ⚠️  Index {} not created: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
