use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use market_client::{FeedState, MarketDataFeed};
use market_common::{AssetClass, ClassSchedule, FeedConfig, FeedKind};
use market_server::{MarketDataService, RandomDraw};

fn service() -> MarketDataService {
    MarketDataService::builder()
        .draw(RandomDraw::seeded(21))
        .build()
        .unwrap()
}

#[test]
fn default_state_is_loading() {
    let state = FeedState::default();
    assert!(state.is_loading);
    assert!(state.data.is_empty());
}

#[test]
fn class_feed_is_loaded_after_mount() {
    let service = service();
    let feed = MarketDataFeed::mount(&service, FeedKind::Indices).unwrap();
    let state = feed.state();
    assert!(!state.is_loading);
    assert_eq!(state.data, service.get_data(AssetClass::Indices).unwrap());
    assert!(feed.is_mounted());
}

#[test]
fn class_feed_follows_ticks() {
    let service = service();
    let (render_tx, render_rx) = unbounded();
    let feed = MarketDataFeed::mount_with_render(&service, FeedKind::Crypto, render_tx).unwrap();
    assert_eq!(render_rx.try_recv().unwrap(), FeedKind::Crypto);

    service.tick(AssetClass::Crypto).unwrap();
    assert_eq!(render_rx.try_recv().unwrap(), FeedKind::Crypto);
    assert_eq!(feed.state().data, service.get_data(AssetClass::Crypto).unwrap());

    service.tick(AssetClass::Stocks).unwrap();
    assert!(render_rx.try_recv().is_err());
}

#[test]
fn unmounted_feed_never_changes_again() {
    let service = service();
    let (render_tx, render_rx) = unbounded();
    let mut feed = MarketDataFeed::mount_with_render(&service, FeedKind::Stocks, render_tx).unwrap();
    let frozen = feed.state();
    feed.unmount();
    feed.unmount();
    let _ = render_rx.try_iter().count();

    service.tick(AssetClass::Stocks).unwrap();
    assert!(!feed.is_mounted());
    assert_eq!(feed.state(), frozen);
    assert!(render_rx.try_recv().is_err());
    assert_eq!(service.subscriber_count(AssetClass::Stocks), 0);
}

#[test]
fn dropping_a_feed_unsubscribes() {
    let service = service();
    {
        let _a = MarketDataFeed::mount(&service, FeedKind::Crypto).unwrap();
        let _b = MarketDataFeed::mount(&service, FeedKind::Crypto).unwrap();
        assert_eq!(service.subscriber_count(AssetClass::Crypto), 2);
    }
    assert_eq!(service.subscriber_count(AssetClass::Crypto), 0);
}

#[test]
fn trending_feed_is_ready_immediately_and_polls() {
    let config = FeedConfig {
        trending_poll_ms: 20,
        ..FeedConfig::default()
    };
    let service = MarketDataService::builder().config(config).build().unwrap();
    let (render_tx, render_rx) = unbounded();
    let mut feed = MarketDataFeed::mount_with_render(&service, FeedKind::Trending, render_tx).unwrap();

    let state = feed.state();
    assert!(!state.is_loading);
    assert_eq!(state.data.len(), 8);
    assert_eq!(render_rx.try_recv().unwrap(), FeedKind::Trending);

    for class in AssetClass::all() {
        service.tick(class).unwrap();
    }
    thread::sleep(Duration::from_millis(100));
    assert!(render_rx.try_iter().count() >= 2);
    assert_eq!(feed.state().data, service.get_trending_data().unwrap());

    feed.unmount();
    let _ = render_rx.try_iter().count();
    thread::sleep(Duration::from_millis(60));
    assert!(render_rx.try_recv().is_err());
}

#[test]
fn feed_tracks_scheduled_updates() {
    let config = FeedConfig {
        crypto: ClassSchedule { interval_ms: 10, volatility: 0.5 },
        ..FeedConfig::default()
    };
    let service = MarketDataService::builder().config(config).build().unwrap();
    let (render_tx, render_rx) = unbounded();
    let feed = MarketDataFeed::mount_with_render(&service, FeedKind::Crypto, render_tx).unwrap();

    service.start_updates().unwrap();
    thread::sleep(Duration::from_millis(100));
    service.stop_updates().unwrap();

    assert!(render_rx.try_iter().count() > 3);
    assert_eq!(feed.state().data, service.get_data(AssetClass::Crypto).unwrap());
}
