//! Blink scheduler tests: countdowns, cancellation and failing writes
//!
//! Time is paused, so every timer fires at its exact deadline.

use ledpulse::{Bit, CancelResult, LedActor, LedError, LedHandle, SimulatedActuator, SimulatedProbe, INFINITE};
use std::time::Duration;
use tokio::sync::broadcast;

fn spawn_led() -> (LedHandle, SimulatedProbe, broadcast::Sender<()>) {
    let (tx, rx) = broadcast::channel(1);
    let (pin, probe) = SimulatedActuator::with_probe();
    let (led, _task) = LedActor::spawn("test", pin, rx);
    (led, probe, tx)
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn finite_blink_turns_off_exactly_n_times() {
    let (led, probe, _shutdown) = spawn_led();

    led.blink(10, 3).await.unwrap();
    sleep_ms(200).await;

    assert_eq!(
        probe.history(),
        vec![Bit::On, Bit::Off, Bit::On, Bit::Off, Bit::On, Bit::Off]
    );
    assert_eq!(probe.off_writes(), 3);
    assert_eq!(probe.state(), Bit::Off);

    let status = led.status().await.unwrap();
    assert!(!status.blinking);
    assert_eq!(status.pending_timers, 0);
}

#[tokio::test(start_paused = true)]
async fn zero_times_writes_on_then_off_once() {
    let (led, probe, _shutdown) = spawn_led();

    led.blink(10, 0).await.unwrap();
    sleep_ms(50).await;

    assert_eq!(probe.history(), vec![Bit::On, Bit::Off]);
    assert!(!led.status().await.unwrap().blinking);
}

#[tokio::test(start_paused = true)]
async fn infinite_blink_alternates_until_cancelled() {
    let (led, probe, _shutdown) = spawn_led();

    led.blink(10, INFINITE).await.unwrap();
    sleep_ms(95).await;

    let history = probe.history();
    assert!(history.len() >= 8, "only {} writes", history.len());
    assert_eq!(history[0], Bit::On);
    assert!(history.windows(2).all(|w| w[0] != w[1]));

    let cancelled = led.cancel_blink().await.unwrap();
    assert!(cancelled.is_cancelled());
    assert!(cancelled.remaining_ms().unwrap() <= 10);

    let writes = probe.write_count();
    sleep_ms(200).await;
    assert_eq!(probe.write_count(), writes);
    assert!(!led.status().await.unwrap().blinking);
}

#[tokio::test(start_paused = true)]
async fn cancel_without_blink_is_not_pending() {
    let (led, probe, _shutdown) = spawn_led();

    assert_eq!(led.cancel_blink().await.unwrap(), CancelResult::NotPending);
    assert_eq!(probe.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_start_write_still_arms_timer() {
    let (led, probe, _shutdown) = spawn_led();
    probe.fail_next_write();

    let err = led.blink(10, 1).await.unwrap_err();
    assert!(matches!(err, LedError::Actuator(_)));
    assert!(led.status().await.unwrap().blinking);

    sleep_ms(50).await;
    assert_eq!(probe.history(), vec![Bit::Off]);
    assert!(!led.status().await.unwrap().blinking);
}

#[tokio::test(start_paused = true)]
async fn blink_replaces_running_countdown() {
    let (led, probe, _shutdown) = spawn_led();

    led.blink(100, 1).await.unwrap();
    led.blink(7, INFINITE).await.unwrap();
    assert_eq!(led.status().await.unwrap().pending_timers, 1);

    led.cancel_blink().await.unwrap();
    let status = led.status().await.unwrap();
    assert_eq!(status.pending_timers, 0);

    sleep_ms(300).await;
    assert_eq!(probe.history(), vec![Bit::On, Bit::On]);
}

#[tokio::test(start_paused = true)]
async fn start_blink_layers_countdowns() {
    let (led, probe, _shutdown) = spawn_led();

    led.start_blink(100, 1).await.unwrap();
    led.start_blink(7, INFINITE).await.unwrap();
    assert_eq!(led.status().await.unwrap().pending_timers, 2);

    // Only the most recent chain is tracked
    led.cancel_blink().await.unwrap();
    let status = led.status().await.unwrap();
    assert!(!status.blinking);
    assert_eq!(status.pending_timers, 1);

    sleep_ms(300).await;
    assert_eq!(probe.state(), Bit::Off);
    assert_eq!(probe.off_writes(), 1);
    assert_eq!(led.status().await.unwrap().pending_timers, 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_set_leaves_blink_running() {
    let (led, probe, _shutdown) = spawn_led();

    led.blink(10, INFINITE).await.unwrap();
    assert!(matches!(led.set(7).await, Err(LedError::InvalidCommand(7))));
    assert_eq!(probe.write_count(), 1);
    assert!(led.status().await.unwrap().blinking);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_blink_and_ends_off() {
    let (led, probe, shutdown) = spawn_led();

    led.blink(10, INFINITE).await.unwrap();
    sleep_ms(15).await;
    shutdown.send(()).unwrap();
    sleep_ms(1).await;

    assert_eq!(probe.state(), Bit::Off);
    let writes = probe.write_count();
    sleep_ms(100).await;
    assert_eq!(probe.write_count(), writes);
    assert!(matches!(led.read().await, Err(LedError::ActorShutdown)));
}
