// Integration tests for the stats service.
//
// These drive the public API end to end: a CSV-backed source feeds the
// service, which enhances, qualifies, caches and rates lines into player
// cards and rendered output.

use std::path::PathBuf;
use std::sync::Arc;

use dugout_app::card::CardRequest;
use dugout_app::render::render_card;
use dugout_app::service::{DatasetCaches, StatsService};
use dugout_app::source::{CsvPopulation, FetchError};
use dugout_baseball::{PercentileTier, ReferenceFrame, StatGroup};
use dugout_core::config::Config;
use dugout_core::{CancelToken, LoadSlot, Outcome};

// ===========================================================================
// Test helpers
// ===========================================================================

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn csv_service() -> StatsService<CsvPopulation> {
    let source = CsvPopulation::new(fixture("hitters_2023.csv"), StatGroup::Hitting);
    StatsService::new(source, Arc::new(DatasetCaches::default()), &Config::default())
        .with_current_season(2030)
}

fn request(player_id: u32) -> CardRequest {
    CardRequest {
        player_id,
        season: 2023,
        group: StatGroup::Hitting,
    }
}

// ===========================================================================
// Player cards
// ===========================================================================

#[tokio::test]
async fn card_from_csv_population() {
    let service = csv_service();
    let card = service
        .player_card(request(102), &CancelToken::never())
        .await
        .ready()
        .expect("card should load");

    // Alpha..Echo have 200+ PA; Foxtrot, Golf fall short; the truncated
    // row is dropped by the loader.
    assert_eq!(card.population_size, 5);
    assert_eq!(card.frame, ReferenceFrame::League { qualified: true });

    // 30 HR among [40, 30, 20, 10, 15]: 3 below, 1 tie → 70
    let hr = card.stat("homeRuns").unwrap();
    assert_eq!(hr.display, "30");
    assert_eq!(hr.percentile, Some(70));
    assert_eq!(hr.tier, PercentileTier::AboveAverage);

    // strikeouts are lower-is-better for hitters: 120 among
    // [140, 120, 100, 90, 80] → 100 - 70
    assert_eq!(card.stat("strikeOuts").unwrap().percentile, Some(30));

    // derived columns are rated too
    let iso = card.stat("iso").unwrap();
    assert_eq!(iso.display, ".222");
    assert!(iso.percentile.is_some());

    let avg = card.stat("avg").unwrap();
    assert_eq!(avg.display, ".278");
}

#[tokio::test]
async fn unqualified_player_is_still_rated_against_qualified_league() {
    let service = csv_service();
    let card = service
        .player_card(request(106), &CancelToken::never())
        .await
        .ready()
        .expect("card should load");

    // 12 HR: only Delta's 10 is below → 20
    assert_eq!(card.stat("homeRuns").unwrap().percentile, Some(20));
    // .313 beats every qualified average
    assert_eq!(card.stat("avg").unwrap().percentile, Some(100));
}

#[tokio::test]
async fn unknown_player_is_not_found() {
    let service = csv_service();
    let outcome = service.player_card(request(999), &CancelToken::never()).await;
    assert!(matches!(outcome, Outcome::Failed(FetchError::NotFound(_))));
}

#[tokio::test]
async fn pitching_request_against_hitting_file_is_not_found() {
    let service = csv_service();
    let outcome = service
        .player_card(
            CardRequest {
                group: StatGroup::Pitching,
                ..request(101)
            },
            &CancelToken::never(),
        )
        .await;
    assert!(matches!(outcome, Outcome::Failed(FetchError::NotFound(_))));
}

#[tokio::test]
async fn rendered_card_lists_every_column() {
    let service = csv_service();
    let card = service
        .player_card(request(101), &CancelToken::never())
        .await
        .ready()
        .unwrap();
    let text = render_card(&card);
    assert_eq!(
        text.lines().count(),
        1 + StatGroup::Hitting.display_columns().len()
    );
    assert!(text.contains("homeRuns"));
}

// ===========================================================================
// Caching and superseding
// ===========================================================================

#[tokio::test]
async fn repeated_cards_reuse_the_caches() {
    let service = csv_service();
    let token = CancelToken::never();
    service.player_card(request(101), &token).await;
    let entries = service.caches().len();
    assert_eq!(entries, 2, "one season line and one population");

    service.player_card(request(101), &token).await;
    assert_eq!(service.caches().len(), entries);

    service.player_card(request(103), &token).await;
    assert_eq!(service.caches().len(), entries + 1);
}

#[tokio::test]
async fn sequential_loads_in_one_slot_both_complete() {
    let service = csv_service();
    let slot = LoadSlot::new();
    assert!(service.load_card(&slot, request(101)).await.is_ready());
    assert!(service.load_card(&slot, request(102)).await.is_ready());
}

#[tokio::test]
async fn career_is_unsupported_for_csv_sources() {
    let service = csv_service();
    let outcome = service
        .career(101, StatGroup::Hitting, &CancelToken::never())
        .await;
    assert!(matches!(outcome, Outcome::Failed(FetchError::Unsupported(_))));
}
