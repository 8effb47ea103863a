use crate::types::{AppError, AppResult, EmbeddingBackend, LLMProvider};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DataConfig {
    pub raw_data_path: PathBuf,
    pub processed_data_path: PathBuf,
    pub vector_db_dir: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub sample_size: usize,
    pub sample_seed: u64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: String,
    pub batch_size: usize,
}

#[derive(Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub model: String,
    pub base_url: Option<String>,
    pub hf_token: String,
    pub openai_api_key: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retriever_k: usize,
}

impl LLMConfig {
    /// API key matching the selected provider
    pub fn api_key(&self) -> &str {
        match self.provider {
            LLMProvider::HuggingFace => &self.hf_token,
            _ => &self.openai_api_key,
        }
    }
}

// Secrets stay out of Debug output since the config is logged at startup.
impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key_set", &!self.api_key.is_empty())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("hf_token_set", &!self.hf_token.is_empty())
            .field("openai_api_key_set", &!self.openai_api_key.is_empty())
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("retriever_k", &self.retriever_k)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let hf_token = env::var("HF_TOKEN")
            .or_else(|_| env::var("token"))
            .unwrap_or_default();
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();

        let embedding_id =
            env::var("EMBEDDING_PROVIDER").unwrap_or_else(|_| "huggingface".to_string());
        let embedding_provider = EmbeddingBackend::from_id(&embedding_id).ok_or_else(|| {
            AppError::Config(format!("Unsupported embedding provider: {}", embedding_id))
        })?;
        let embedding_api_key = match embedding_provider {
            EmbeddingBackend::HuggingFace => hf_token.clone(),
            EmbeddingBackend::OpenAI => openai_api_key.clone(),
        };

        let provider_id = env::var("LLM_PROVIDER").unwrap_or_else(|_| "huggingface".to_string());
        let provider = LLMProvider::from_id(&provider_id)
            .ok_or_else(|| AppError::Config(format!("Unsupported LLM provider: {}", provider_id)))?;

        let config = Self {
            server: ServerConfig {
                port: parse_var("PORT", 7860)?,
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:7860,http://127.0.0.1:7860".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            data: DataConfig {
                raw_data_path: path_var("RAW_DATA_PATH", "data/raw/complaints.csv"),
                processed_data_path: path_var(
                    "PROCESSED_DATA_PATH",
                    "data/processed/filtered_complaints.csv",
                ),
                vector_db_dir: path_var("VECTOR_DB_DIR", "vector_store/complaints_index"),
                log_dir: path_var("LOG_DIR", "logs"),
            },
            index: IndexConfig {
                sample_size: parse_var("SAMPLE_SIZE", 12_000)?,
                sample_seed: parse_var("SAMPLE_SEED", 42)?,
                chunk_size: parse_var("CHUNK_SIZE", 500)?,
                chunk_overlap: parse_var("CHUNK_OVERLAP", 50)?,
            },
            embedding: EmbeddingConfig {
                provider: embedding_provider,
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string()),
                base_url: env::var("EMBEDDING_BASE_URL").ok(),
                api_key: embedding_api_key,
                batch_size: parse_var("EMBEDDING_BATCH_SIZE", 64)?,
            },
            llm: LLMConfig {
                provider,
                model: env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "meta-llama/Llama-3.2-3B-Instruct".to_string()),
                base_url: env::var("LLM_BASE_URL").ok(),
                hf_token,
                openai_api_key,
                max_tokens: parse_var("LLM_MAX_TOKENS", 512)?,
                temperature: parse_var("LLM_TEMPERATURE", 0.1)?,
                retriever_k: parse_var("RETRIEVER_K", 3)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.index.chunk_size == 0 {
            return Err(AppError::Config("CHUNK_SIZE must be positive".to_string()));
        }
        if self.index.chunk_overlap > self.index.chunk_size {
            return Err(AppError::Config(format!(
                "CHUNK_OVERLAP ({}) is larger than CHUNK_SIZE ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "EMBEDDING_BATCH_SIZE must be positive".to_string(),
            ));
        }
        if self.llm.retriever_k == 0 {
            return Err(AppError::Config("RETRIEVER_K must be positive".to_string()));
        }
        Ok(())
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_var<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {} ({})", key, raw, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            port: 7860,
            host: "127.0.0.1".to_string(),
            cors_allowed_origins: vec!["http://localhost:7860".to_string()],
        },
        data: DataConfig {
            raw_data_path: PathBuf::from("data/raw/complaints.csv"),
            processed_data_path: PathBuf::from("data/processed/filtered_complaints.csv"),
            vector_db_dir: PathBuf::from("vector_store/complaints_index"),
            log_dir: PathBuf::from("logs"),
        },
        index: IndexConfig {
            sample_size: 12_000,
            sample_seed: 42,
            chunk_size: 500,
            chunk_overlap: 50,
        },
        embedding: EmbeddingConfig {
            provider: EmbeddingBackend::HuggingFace,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            base_url: None,
            api_key: "hf_test".to_string(),
            batch_size: 64,
        },
        llm: LLMConfig {
            provider: LLMProvider::HuggingFace,
            model: "meta-llama/Llama-3.2-3B-Instruct".to_string(),
            base_url: None,
            hf_token: "hf_test".to_string(),
            openai_api_key: String::new(),
            max_tokens: 512,
            temperature: 0.1,
            retriever_k: 3,
        },
    }
}
