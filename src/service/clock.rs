// src/service/clock.rs

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Fuente de tiempo en segundos epoch, inyectable en ingestor y sweeper para
/// que los tests puedan manejar valores literales de `now`.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Reloj de pared del sistema.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Reloj manual para tests: avanza solo cuando el test lo pide.
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self { now: AtomicI64::new(start) }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
