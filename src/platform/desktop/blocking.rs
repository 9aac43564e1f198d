use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs `f` on its own thread so the window keeps repainting.
pub fn spawn_blocking<F, T>(f: F) -> Receiver<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx
}

/// Waits for a [`spawn_blocking`] result, calling `on_tick` between polls.
/// `None` means the thread went away without answering.
pub async fn wait_for<T>(rx: Receiver<T>, mut on_tick: impl FnMut()) -> Option<T> {
    loop {
        match rx.try_recv() {
            Ok(value) => {
                on_tick();
                return Some(value);
            }
            Err(TryRecvError::Empty) => {
                on_tick();
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(TryRecvError::Disconnected) => return None,
        }
    }
}

pub async fn run_blocking<F, T>(f: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    wait_for(spawn_blocking(f), || {}).await
}
