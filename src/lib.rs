pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use crate::application::refresh_signals::{RefreshSignalsUseCase, SignalReport};
use crate::application::resolve_entities::{ResolveEntitiesUseCase, ResolutionScan};
use crate::application::run_backtest::{BacktestUseCase, Scorecard};
use crate::application::score_conviction::ScoreConvictionUseCase;
use crate::domain::entities::canonical_entity::CanonicalEntity;
use crate::domain::entities::conviction::ConvictionAssessment;
use crate::domain::entities::resolution::EntityResolution;
use crate::domain::entities::snapshot::{RawSourceOutput, SourceSnapshot};
use crate::domain::error::DomainError;
use crate::domain::ports::assessment_repository::AssessmentRepository;
use crate::domain::ports::market_feed::MarketFeed;
use crate::domain::ports::snapshot_store::SnapshotStore;
use crate::domain::values::source_category::SourceCategory;
use crate::infrastructure::config::{AmbiguityRules, AppConfig};
use crate::infrastructure::feeds::equities::EquityFeed;
use crate::infrastructure::feeds::macro_series::MacroFeed;
use crate::infrastructure::feeds::tokens::TokenFeed;
use crate::infrastructure::registry::{Registry, RegistryHandle};
use crate::infrastructure::sqlite::assessment_repo::SqliteAssessmentRepo;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::snapshot_store::SqliteSnapshotStore;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub struct TrendIntel {
    registry: Arc<RegistryHandle>,
    snapshot_store: Arc<dyn SnapshotStore>,
    assessments: Arc<dyn AssessmentRepository>,
    resolve_uc: ResolveEntitiesUseCase,
    refresh_uc: RefreshSignalsUseCase,
    score_uc: ScoreConvictionUseCase,
    backtest_uc: BacktestUseCase,
}

impl TrendIntel {
    /// Wire the real feeds from config. Config errors are fatal here,
    /// before anything fetches or scores.
    pub fn new(db_path: &str, config_dir: &Path) -> Result<Self, DomainError> {
        let config = AppConfig::load(config_dir)?;

        let tickers: Vec<String> = config
            .buckets
            .tickers
            .iter()
            .map(|t| t.symbol.clone())
            .collect();
        let token_ids: Vec<String> = config
            .buckets
            .tokens
            .iter()
            .map(|t| t.symbol.clone())
            .collect();
        let series_ids: Vec<String> = config
            .macro_series
            .iter()
            .map(|s| s.series_id.clone())
            .collect();

        let equities: Arc<dyn MarketFeed> = Arc::new(EquityFeed::new(tickers));
        let tokens: Arc<dyn MarketFeed> = Arc::new(TokenFeed::new(token_ids));
        let macro_feed: Arc<dyn MarketFeed> = Arc::new(MacroFeed::new(series_ids));

        Self::with_providers(db_path, config, equities, tokens, macro_feed)
    }

    /// Wire with injected feeds; tests pass fakes and `:memory:` here.
    pub fn with_providers(
        db_path: &str,
        config: AppConfig,
        equities: Arc<dyn MarketFeed>,
        tokens: Arc<dyn MarketFeed>,
        macro_feed: Arc<dyn MarketFeed>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let conn1 = Connection::open(db_path)
            .map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn1
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        let conn2 = Connection::open(db_path)
            .map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn2
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;

        run_migrations(&conn1)?;
        run_migrations(&conn2)?;

        let registry = Arc::new(RegistryHandle::new(Registry::build(
            1,
            config.entities.clone(),
            config.ambiguity.clone(),
        )?));
        let snapshot_store: Arc<dyn SnapshotStore> =
            Arc::new(SqliteSnapshotStore::new(conn1, config.sources.clone()));
        let assessments: Arc<dyn AssessmentRepository> =
            Arc::new(SqliteAssessmentRepo::new(conn2));

        Ok(Self {
            resolve_uc: ResolveEntitiesUseCase::new(registry.clone(), snapshot_store.clone()),
            refresh_uc: RefreshSignalsUseCase::new(
                equities,
                tokens,
                macro_feed,
                config.buckets.clone(),
                config.macro_series.clone(),
            ),
            score_uc: ScoreConvictionUseCase::new(
                registry.clone(),
                snapshot_store.clone(),
                assessments.clone(),
            ),
            backtest_uc: BacktestUseCase::new(
                registry.clone(),
                snapshot_store.clone(),
                config.ground_truth.clone(),
            ),
            registry,
            snapshot_store,
            assessments,
        })
    }

    // Delegating methods
    pub fn build_snapshot(
        &self,
        date: NaiveDate,
        raw_outputs: &[RawSourceOutput],
    ) -> Result<SourceSnapshot, DomainError> {
        self.snapshot_store.build_snapshot(date, raw_outputs)
    }

    pub fn get_snapshot(&self, date: NaiveDate) -> Result<SourceSnapshot, DomainError> {
        self.snapshot_store.get_snapshot(date)
    }

    pub fn snapshot_dates(&self) -> Result<Vec<NaiveDate>, DomainError> {
        self.snapshot_store.list_dates()
    }

    pub fn resolve_entities(&self, date: NaiveDate) -> Result<ResolutionScan, DomainError> {
        self.resolve_uc.execute(date)
    }

    pub fn resolve_name(
        &self,
        raw_name: &str,
        source_category: Option<SourceCategory>,
        context: &str,
    ) -> EntityResolution {
        self.resolve_uc.resolve_name(raw_name, source_category, context)
    }

    pub async fn refresh_signals(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> Result<SignalReport, DomainError> {
        self.refresh_uc.execute(as_of, window_days).await
    }

    pub fn score_conviction(
        &self,
        entity_id: &str,
        date: NaiveDate,
    ) -> Result<ConvictionAssessment, DomainError> {
        self.score_uc.execute(entity_id, date)
    }

    pub fn get_assessment(
        &self,
        entity_id: &str,
        analysis_date: NaiveDate,
    ) -> Result<Option<ConvictionAssessment>, DomainError> {
        self.assessments.get(entity_id, analysis_date)
    }

    pub fn run_backtest(
        &self,
        prediction_date: NaiveDate,
        validation_date: NaiveDate,
        top_k: usize,
    ) -> Result<Scorecard, DomainError> {
        self.backtest_uc.execute(prediction_date, validation_date, top_k)
    }

    /// Hot-reload the registry: atomic swap, generation bump. In-flight
    /// resolutions keep the version they started with.
    pub fn reload_registry(
        &self,
        entities: Vec<CanonicalEntity>,
        ambiguity: AmbiguityRules,
    ) -> Result<u64, DomainError> {
        self.registry.reload(entities, ambiguity)
    }

    pub fn registry_version(&self) -> u64 {
        self.registry.current().version()
    }
}
