// Cached, cancellable access to season lines, populations and careers.
//
// Math and cache operations are synchronous; only source fetches suspend.
// Cache locks are never held across an `.await`. A fetch that loses the race
// against its cancel token resolves to `Outcome::Cancelled` and writes
// nothing.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Datelike;
use tracing::{debug, info, warn};

use dugout_baseball::{build_career, enhance, CareerRules, CareerTable, QualificationRules, QualifiedPopulation, SeasonLine, StatGroup, StatLine};
use dugout_core::cache::{ExpiringCache, LONG_TTL, SHORT_TTL};
use dugout_core::config::{CacheConfig, Config};
use dugout_core::{cache_key, CancelToken, LoadSlot, Outcome};

use crate::card::{CardRequest, PlayerCard};
use crate::source::{FetchError, StatsSource};

pub type FetchOutcome<T> = Outcome<T, FetchError>;

/// The calendar year, which is the season treated as live.
pub fn current_season() -> u16 {
    u16::try_from(chrono::Local::now().year()).unwrap_or(u16::MAX)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// DatasetCaches
// ---------------------------------------------------------------------------

/// Every cache the service reads through. Completed seasons and histories
/// live in long-TTL caches; the live season in short-TTL ones.
#[derive(Debug)]
pub struct DatasetCaches {
    season_lines: Mutex<ExpiringCache<Option<StatLine>>>,
    live_season_lines: Mutex<ExpiringCache<Option<StatLine>>>,
    populations: Mutex<ExpiringCache<Arc<QualifiedPopulation>>>,
    live_populations: Mutex<ExpiringCache<Arc<QualifiedPopulation>>>,
    year_by_year: Mutex<ExpiringCache<Vec<SeasonLine>>>,
}

impl Default for DatasetCaches {
    fn default() -> Self {
        Self::new(LONG_TTL, SHORT_TTL)
    }
}

impl DatasetCaches {
    pub fn new(long: Duration, short: Duration) -> Self {
        Self {
            season_lines: Mutex::new(ExpiringCache::new(long)),
            live_season_lines: Mutex::new(ExpiringCache::new(short)),
            populations: Mutex::new(ExpiringCache::new(long)),
            live_populations: Mutex::new(ExpiringCache::new(short)),
            year_by_year: Mutex::new(ExpiringCache::new(long)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.long_ttl(), config.short_ttl())
    }

    /// Stored entries across all caches, expired ones included.
    pub fn len(&self) -> usize {
        lock(&self.season_lines).len()
            + lock(&self.live_season_lines).len()
            + lock(&self.populations).len()
            + lock(&self.live_populations).len()
            + lock(&self.year_by_year).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.season_lines).clear();
        lock(&self.live_season_lines).clear();
        lock(&self.populations).clear();
        lock(&self.live_populations).clear();
        lock(&self.year_by_year).clear();
    }
}

/// Read `key` from `cache`, or run `fetch` racing `cancel` and store the
/// result. Cancelled and failed fetches store nothing.
async fn read_through<T, Fut>(
    cache: &Mutex<ExpiringCache<T>>,
    key: String,
    cancel: &CancelToken,
    fetch: Fut,
) -> FetchOutcome<T>
where
    T: Clone,
    Fut: Future<Output = Result<T, FetchError>>,
{
    if cancel.is_cancelled() {
        return Outcome::Cancelled;
    }
    let hit = lock(cache).get(&key);
    if let Some(value) = hit {
        return Outcome::Ready(value);
    }

    match cancel.run(fetch).await {
        None => {
            debug!(key, "fetch cancelled");
            Outcome::Cancelled
        }
        Some(Err(e)) => {
            warn!("fetch for {} failed: {}", key, e);
            Outcome::Failed(e)
        }
        Some(Ok(_)) if cancel.is_cancelled() => Outcome::Cancelled,
        Some(Ok(value)) => {
            lock(cache).set(key, value.clone());
            Outcome::Ready(value)
        }
    }
}

// ---------------------------------------------------------------------------
// StatsService
// ---------------------------------------------------------------------------

/// Front door for every data-bearing view.
pub struct StatsService<S> {
    source: S,
    caches: Arc<DatasetCaches>,
    qualification: QualificationRules,
    career: CareerRules,
    current_season: u16,
}

impl<S: StatsSource> StatsService<S> {
    pub fn new(source: S, caches: Arc<DatasetCaches>, config: &Config) -> Self {
        Self {
            source,
            caches,
            qualification: QualificationRules {
                min_plate_appearances: config.qualification.min_plate_appearances,
                min_innings_pitched: config.qualification.min_innings_pitched,
            },
            career: CareerRules {
                min_sample: config.career.min_sample,
                sport_id: config.api.sport_id,
            },
            current_season: current_season(),
        }
    }

    /// Override which season is treated as live (short TTL).
    pub fn with_current_season(mut self, season: u16) -> Self {
        self.current_season = season;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn caches(&self) -> &Arc<DatasetCaches> {
        &self.caches
    }

    pub fn qualification(&self) -> &QualificationRules {
        &self.qualification
    }

    fn is_live(&self, season: u16) -> bool {
        season >= self.current_season
    }

    /// A subject's enhanced line for one season. `Ready(None)` when the
    /// source has no line for it.
    pub async fn season_line(
        &self,
        player_id: u32,
        season: u16,
        group: StatGroup,
        cancel: &CancelToken,
    ) -> FetchOutcome<Option<StatLine>> {
        let cache = if self.is_live(season) {
            &self.caches.live_season_lines
        } else {
            &self.caches.season_lines
        };
        let fetch = async {
            let line = self.source.player_season(player_id, season, group).await?;
            Ok(line.map(|line| enhance(&line, group)))
        };
        read_through(cache, cache_key!(player_id, season, group), cancel, fetch).await
    }

    /// The enhanced, qualified league population for a season and group.
    pub async fn qualified_population(
        &self,
        season: u16,
        group: StatGroup,
        cancel: &CancelToken,
    ) -> FetchOutcome<Arc<QualifiedPopulation>> {
        let cache = if self.is_live(season) {
            &self.caches.live_populations
        } else {
            &self.caches.populations
        };
        let fetch = async {
            let raw = self.source.season_population(season, group).await?;
            let qualified = raw.enhanced().qualify(&self.qualification);
            info!(
                "{} {}: {} of {} lines qualified",
                season,
                group,
                qualified.len(),
                raw.len()
            );
            Ok(Arc::new(qualified))
        };
        read_through(cache, cache_key!(season, group), cancel, fetch).await
    }

    /// Season-by-season table with self-relative percentiles and the career
    /// line.
    pub async fn career(
        &self,
        player_id: u32,
        group: StatGroup,
        cancel: &CancelToken,
    ) -> FetchOutcome<CareerTable> {
        let fetch = self.source.year_by_year(player_id, group);
        let seasons = read_through(
            &self.caches.year_by_year,
            cache_key!(player_id, group),
            cancel,
            fetch,
        )
        .await;
        seasons.map(|seasons| build_career(seasons, group, &self.career))
    }

    /// Season line, then population, then percentiles.
    pub async fn player_card(
        &self,
        request: CardRequest,
        cancel: &CancelToken,
    ) -> FetchOutcome<PlayerCard> {
        let CardRequest {
            player_id,
            season,
            group,
        } = request;

        let line = match self.season_line(player_id, season, group, cancel).await {
            Outcome::Ready(Some(line)) => line,
            Outcome::Ready(None) => {
                return Outcome::Failed(FetchError::NotFound(format!(
                    "no {group} stats for player {player_id} in {season}"
                )))
            }
            Outcome::Cancelled => return Outcome::Cancelled,
            Outcome::Failed(e) => return Outcome::Failed(e),
        };

        self.qualified_population(season, group, cancel)
            .await
            .map(|population| PlayerCard::build(request, line, &population))
    }

    /// Load a card into `slot`, superseding whatever the slot was loading.
    pub async fn load_card(&self, slot: &LoadSlot, request: CardRequest) -> FetchOutcome<PlayerCard> {
        let ticket = slot.begin();
        let outcome = self.player_card(request, ticket.token()).await;
        slot.finish(&ticket, outcome)
    }

    /// Load a career table into `slot`, superseding whatever it was loading.
    pub async fn load_career(
        &self,
        slot: &LoadSlot,
        player_id: u32,
        group: StatGroup,
    ) -> FetchOutcome<CareerTable> {
        let ticket = slot.begin();
        let outcome = self.career(player_id, group, ticket.token()).await;
        slot.finish(&ticket, outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dugout_baseball::{Population, PopulationEntry};
    use dugout_core::cancel_pair;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source with call counters and an optional latency.
    #[derive(Default)]
    struct FakeSource {
        delay: Duration,
        fail: bool,
        season_calls: AtomicUsize,
        population_calls: AtomicUsize,
        history_calls: AtomicUsize,
    }

    impl FakeSource {
        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        async fn pause(&self) -> Result<(), FetchError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(FetchError::NotFound("fake outage".into()));
            }
            Ok(())
        }
    }

    fn hitter(id: u32, pa: f64, hr: f64) -> PopulationEntry {
        PopulationEntry {
            player_id: Some(id),
            name: format!("Player {id}"),
            team: None,
            line: StatLine::new()
                .with("plateAppearances", pa)
                .with("atBats", pa - 50.0)
                .with("hits", 120.0)
                .with("homeRuns", hr),
        }
    }

    fn league() -> Vec<PopulationEntry> {
        vec![
            hitter(1, 600.0, 40.0),
            hitter(2, 550.0, 30.0),
            hitter(3, 500.0, 20.0),
            hitter(4, 450.0, 10.0),
            hitter(5, 100.0, 50.0),
        ]
    }

    #[async_trait]
    impl StatsSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn player_season(
            &self,
            player_id: u32,
            _season: u16,
            _group: StatGroup,
        ) -> Result<Option<StatLine>, FetchError> {
            self.season_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await?;
            Ok(league()
                .into_iter()
                .find(|e| e.player_id == Some(player_id))
                .map(|e| e.line))
        }

        async fn season_population(
            &self,
            _season: u16,
            group: StatGroup,
        ) -> Result<Population, FetchError> {
            self.population_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await?;
            Ok(Population::new(group, league()))
        }

        async fn year_by_year(
            &self,
            _player_id: u32,
            _group: StatGroup,
        ) -> Result<Vec<SeasonLine>, FetchError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await?;
            Ok(league()
                .into_iter()
                .zip(2019u16..)
                .map(|(entry, year)| SeasonLine {
                    season: year.to_string(),
                    sport_id: Some(1),
                    team: None,
                    line: entry.line,
                })
                .collect())
        }
    }

    fn service(source: FakeSource) -> StatsService<FakeSource> {
        StatsService::new(source, Arc::new(DatasetCaches::default()), &Config::default())
            .with_current_season(2024)
    }

    fn card_request(player_id: u32) -> CardRequest {
        CardRequest {
            player_id,
            season: 2023,
            group: StatGroup::Hitting,
        }
    }

    // -- Caching --

    #[tokio::test]
    async fn season_lines_are_enhanced_and_cached() {
        let svc = service(FakeSource::default());
        let token = CancelToken::never();

        let first = svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        let line = first.ready().flatten().expect("player 1 has a line");
        assert!(line.contains("iso"));

        svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interleaved_fetches_keep_their_own_keys() {
        let svc = service(FakeSource::slow(Duration::from_secs(5)));
        let token = CancelToken::never();

        // player 1 finishes at 5s, player 3 at 6s, while player 1's write lands
        let (first, second) = tokio::join!(
            svc.season_line(1, 2023, StatGroup::Hitting, &token),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                svc.season_line(3, 2023, StatGroup::Hitting, &token).await
            }
        );
        let first = first.ready().flatten().expect("player 1 has a line");
        let second = second.ready().flatten().expect("player 3 has a line");
        assert_eq!(first.number("homeRuns"), Some(40.0));
        assert_eq!(second.number("homeRuns"), Some(20.0));
        assert_eq!(svc.caches().len(), 2);
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 2);

        let again_first = svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        let again_second = svc.season_line(3, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(again_first.ready().flatten(), Some(first));
        assert_eq!(again_second.ready().flatten(), Some(second));
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_subjects_are_cached_as_absent() {
        let svc = service(FakeSource::default());
        let token = CancelToken::never();
        let outcome = svc.season_line(99, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(outcome.ready(), Some(None));
        svc.season_line(99, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn live_season_expires_before_completed_seasons() {
        let svc = service(FakeSource::default());
        let token = CancelToken::never();

        svc.season_line(1, 2024, StatGroup::Hitting, &token).await;
        svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        svc.season_line(1, 2024, StatGroup::Hitting, &token).await;
        svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_secs(25 * 60)).await;
        svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn population_is_enhanced_then_qualified() {
        let svc = service(FakeSource::default());
        let token = CancelToken::never();
        let population = svc
            .qualified_population(2023, StatGroup::Hitting, &token)
            .await
            .ready()
            .unwrap();
        assert_eq!(population.len(), 4);
        assert!(population.entries().iter().all(|e| e.line.contains("babip")));

        svc.qualified_population(2023, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().population_calls.load(Ordering::SeqCst), 1);
    }

    // -- Cancellation and failure --

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetch_writes_nothing() {
        let svc = service(FakeSource::slow(Duration::from_secs(10)));
        let (handle, token) = cancel_pair();

        let (outcome, _) = tokio::join!(
            svc.qualified_population(2023, StatGroup::Hitting, &token),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                handle.cancel();
            }
        );
        assert!(outcome.is_cancelled());
        assert!(svc.caches().is_empty());

        let fresh = CancelToken::never();
        assert!(svc
            .qualified_population(2023, StatGroup::Hitting, &fresh)
            .await
            .is_ready());
        assert_eq!(svc.source().population_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_the_source() {
        let svc = service(FakeSource::default());
        let (handle, token) = cancel_pair();
        handle.cancel();
        let outcome = svc.season_line(1, 2023, StatGroup::Hitting, &token).await;
        assert!(outcome.is_cancelled());
        assert_eq!(svc.source().season_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_surface_and_are_not_cached() {
        let svc = service(FakeSource {
            fail: true,
            ..FakeSource::default()
        });
        let token = CancelToken::never();
        let outcome = svc.player_card(card_request(1), &token).await;
        assert!(matches!(outcome, Outcome::Failed(FetchError::NotFound(_))));
        assert!(svc.caches().is_empty());
    }

    // -- Player cards --

    #[tokio::test]
    async fn card_ranks_against_qualified_league() {
        let svc = service(FakeSource::default());
        let card = svc
            .player_card(card_request(2), &CancelToken::never())
            .await
            .ready()
            .unwrap();
        // 30 HR among qualified [40, 30, 20, 10]: 2 below, 1 tie → 63
        assert_eq!(card.stat("homeRuns").unwrap().percentile, Some(63));
        assert_eq!(card.population_size, 4);
    }

    #[tokio::test]
    async fn unknown_player_card_fails_before_population_fetch() {
        let svc = service(FakeSource::default());
        let outcome = svc.player_card(card_request(42), &CancelToken::never()).await;
        assert!(matches!(outcome, Outcome::Failed(FetchError::NotFound(_))));
        assert_eq!(svc.source().population_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_load_supersedes_older_one() {
        let svc = service(FakeSource::slow(Duration::from_secs(5)));
        let slot = LoadSlot::new();

        let (older, newer) = tokio::join!(svc.load_card(&slot, card_request(1)), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            svc.load_card(&slot, card_request(3)).await
        });

        assert!(older.is_cancelled());
        let card = newer.ready().expect("newest load completes");
        assert_eq!(card.player_id, 3);
    }

    // -- Career --

    #[tokio::test]
    async fn career_builds_from_cached_history() {
        let svc = service(FakeSource::default());
        let token = CancelToken::never();
        let table = svc.career(1, StatGroup::Hitting, &token).await.ready().unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0].season, "2019");
        let career = table.career.as_ref().unwrap();
        assert_eq!(career.number("homeRuns"), Some(150.0));

        svc.career(1, StatGroup::Hitting, &token).await;
        assert_eq!(svc.source().history_calls.load(Ordering::SeqCst), 1);
    }
}
