//! Shared test fixtures for the FoodGrade SDK integration tests.
//!
//! Provides temp-dir backed stores, counting wrappers around the store and
//! the remote source, a scripted HTTP transport, a sleeper that records
//! instead of sleeping, and a scripted camera.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use foodgrade_sdk::capture::{CameraDevice, FacingMode, FrameBuffer, VideoTrack};
use foodgrade_sdk::identifier::Identifier;
use foodgrade_sdk::models::{
    Nutrition, ProductRecord, Recommendation, ScanHistoryEntry, Sustainability,
};
use foodgrade_sdk::remote::{HttpResponse, Transport};
use foodgrade_sdk::timing::Sleeper;
use foodgrade_sdk::{FoodGradeError, MockCatalog, ProductCache, ProductStore, RemoteDataSource};
use serde_json::Value;

pub const GOODDAY: &str = "8901063004122";
pub const QUINOA: &str = "5901234123457";
pub const UNKNOWN: &str = "0000000000000";

// ---------------------------------------------------------------------------
// Products and stores
// ---------------------------------------------------------------------------

/// A minimal valid product with the given barcode.
pub fn product(barcode: &str, name: &str) -> ProductRecord {
    ProductRecord {
        barcode: Identifier::parse(barcode).unwrap(),
        name: name.to_string(),
        brand: "Test Brand".to_string(),
        grade: "B".to_string(),
        nutrition: Nutrition {
            calories: 100.0,
            protein: 3.0,
            carbs: 12.0,
            fat: 4.0,
            sugars: 6.0,
            saturated_fat: 1.0,
        },
        sustainability: Sustainability {
            carbon_footprint: 1.0,
            packaging_score: 3.0,
            water_usage: 10.0,
            eco_score: 50,
        },
        ingredients: vec!["Water".to_string()],
        image_url: None,
        allergens: Vec::new(),
        labels: Vec::new(),
        category: None,
        origin: None,
        processing_level: None,
        packaging: None,
        nutrition_grade_raw: None,
        cached_at: None,
    }
}

/// Thirteen-digit barcode ending in `n`.
pub fn barcode(n: u32) -> String {
    format!("{:013}", 4000000000000u64 + n as u64)
}

/// A file-backed store in a fresh temp dir. Keep the `TempDir` alive.
pub fn temp_store() -> (ProductStore, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let store = ProductStore::new(tmp_dir.path().join("store").join("test.duckdb"));
    (store, tmp_dir)
}

// ---------------------------------------------------------------------------
// CountingStore
// ---------------------------------------------------------------------------

/// Wraps a [`ProductStore`] and counts every call.
pub struct CountingStore {
    pub inner: ProductStore,
    pub gets: Cell<usize>,
    pub puts: Cell<usize>,
    pub appends: Cell<usize>,
    pub kv_reads: Cell<usize>,
    pub kv_writes: Cell<usize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: ProductStore::in_memory(),
            gets: Cell::new(0),
            puts: Cell::new(0),
            appends: Cell::new(0),
            kv_reads: Cell::new(0),
            kv_writes: Cell::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.gets.get()
            + self.puts.get()
            + self.appends.get()
            + self.kv_reads.get()
            + self.kv_writes.get()
    }
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

impl ProductCache for CountingStore {
    fn get(&self, id: &Identifier) -> foodgrade_sdk::Result<Option<ProductRecord>> {
        bump(&self.gets);
        self.inner.get(id)
    }

    fn put(&self, record: &ProductRecord) -> foodgrade_sdk::Result<ProductRecord> {
        bump(&self.puts);
        self.inner.put(record)
    }

    fn append_history(&self, record: &ProductRecord) -> foodgrade_sdk::Result<ScanHistoryEntry> {
        bump(&self.appends);
        self.inner.append_history(record)
    }

    fn get_value(&self, key: &str) -> foodgrade_sdk::Result<Option<Value>> {
        bump(&self.kv_reads);
        self.inner.get_value(key)
    }

    fn put_value(&self, key: &str, value: &Value) -> foodgrade_sdk::Result<()> {
        bump(&self.kv_writes);
        self.inner.put_value(key, value)
    }

    fn update_value(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> foodgrade_sdk::Result<Value>,
    ) -> foodgrade_sdk::Result<Value> {
        bump(&self.kv_writes);
        self.inner.update_value(key, f)
    }
}

/// A store whose every call fails.
pub struct BrokenStore;

impl ProductCache for BrokenStore {
    fn get(&self, _id: &Identifier) -> foodgrade_sdk::Result<Option<ProductRecord>> {
        Err(FoodGradeError::StorageUnavailable("disk gone".into()))
    }

    fn put(&self, _record: &ProductRecord) -> foodgrade_sdk::Result<ProductRecord> {
        Err(FoodGradeError::StorageUnavailable("disk gone".into()))
    }

    fn append_history(&self, _record: &ProductRecord) -> foodgrade_sdk::Result<ScanHistoryEntry> {
        Err(FoodGradeError::StorageUnavailable("disk gone".into()))
    }

    fn get_value(&self, _key: &str) -> foodgrade_sdk::Result<Option<Value>> {
        Err(FoodGradeError::StorageUnavailable("disk gone".into()))
    }

    fn put_value(&self, _key: &str, _value: &Value) -> foodgrade_sdk::Result<()> {
        Err(FoodGradeError::StorageUnavailable("disk gone".into()))
    }

    fn update_value(
        &self,
        _key: &str,
        _f: &mut dyn FnMut(Option<Value>) -> foodgrade_sdk::Result<Value>,
    ) -> foodgrade_sdk::Result<Value> {
        Err(FoodGradeError::StorageUnavailable("disk gone".into()))
    }
}

// ---------------------------------------------------------------------------
// CountingRemote
// ---------------------------------------------------------------------------

/// Wraps a [`MockCatalog`] and counts product and recommendation fetches.
///
/// The counters are shared, so a clone handed to the SDK still reports to
/// the test.
#[derive(Clone)]
pub struct CountingRemote {
    pub catalog: MockCatalog,
    pub product_calls: Arc<AtomicUsize>,
    pub recommendation_calls: Arc<AtomicUsize>,
    pub fail_with: Option<fn() -> FoodGradeError>,
}

impl CountingRemote {
    pub fn new() -> Self {
        Self {
            catalog: MockCatalog::new(),
            product_calls: Arc::new(AtomicUsize::new(0)),
            recommendation_calls: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
        }
    }

    pub fn failing(fail_with: fn() -> FoodGradeError) -> Self {
        Self {
            fail_with: Some(fail_with),
            ..Self::new()
        }
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn recommendation_calls(&self) -> usize {
        self.recommendation_calls.load(Ordering::SeqCst)
    }
}

impl RemoteDataSource for CountingRemote {
    fn fetch_product(&self, id: &Identifier) -> foodgrade_sdk::Result<Option<ProductRecord>> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.catalog.fetch_product(id)
    }

    fn fetch_recommendations(
        &self,
        id: &Identifier,
    ) -> foodgrade_sdk::Result<Option<Vec<Recommendation>>> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.catalog.fetch_recommendations(id)
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Replays canned responses in order; the last one repeats once the script
/// runs out.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<foodgrade_sdk::Result<HttpResponse>>>,
    last: Mutex<Option<HttpResponse>>,
    pub requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: fn() -> FoodGradeError) -> Self {
        let transport = Self::new(Vec::new());
        transport.responses.lock().unwrap().push_back(Err(error()));
        transport
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> foodgrade_sdk::Result<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(resp)) => {
                *self.last.lock().unwrap() = Some(resp.clone());
                Ok(resp)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| HttpResponse::new(404, ""))),
        }
    }
}

/// JSON body for `product`.
pub fn product_body(product: &ProductRecord) -> String {
    serde_json::to_string(product).unwrap()
}

// ---------------------------------------------------------------------------
// FakeCamera
// ---------------------------------------------------------------------------

/// Shared view of what the camera was asked to do.
#[derive(Default)]
pub struct CameraLog {
    pub opens: AtomicUsize,
    pub stops: AtomicUsize,
    pub facings: Mutex<Vec<FacingMode>>,
    pub torch_calls: AtomicUsize,
}

impl CameraLog {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Tracks currently held.
    pub fn live_tracks(&self) -> usize {
        self.opens() - self.stops()
    }
}

pub struct FakeCamera {
    pub log: Arc<CameraLog>,
    pub deny: bool,
    pub torch: bool,
    pub torch_fails: bool,
    pub dimensions: (u32, u32),
}

impl FakeCamera {
    pub fn new(log: Arc<CameraLog>) -> Self {
        Self {
            log,
            deny: false,
            torch: false,
            torch_fails: false,
            dimensions: (640, 480),
        }
    }
}

impl CameraDevice for FakeCamera {
    fn open(
        &mut self,
        facing: FacingMode,
        _resolution: (u32, u32),
    ) -> foodgrade_sdk::Result<Box<dyn VideoTrack>> {
        if self.deny {
            return Err(FoodGradeError::DeviceUnavailable(
                "Permission denied".to_string(),
            ));
        }
        self.log.opens.fetch_add(1, Ordering::SeqCst);
        self.log.facings.lock().unwrap().push(facing);
        Ok(Box::new(FakeTrack {
            log: self.log.clone(),
            torch: self.torch,
            torch_fails: self.torch_fails,
            dimensions: self.dimensions,
            stopped: false,
        }))
    }
}

struct FakeTrack {
    log: Arc<CameraLog>,
    torch: bool,
    torch_fails: bool,
    dimensions: (u32, u32),
    stopped: bool,
}

impl VideoTrack for FakeTrack {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn read_frame(&mut self, buffer: &mut FrameBuffer) -> foodgrade_sdk::Result<()> {
        assert_eq!(
            buffer.pixels.len(),
            (self.dimensions.0 * self.dimensions.1 * 4) as usize
        );
        buffer.pixels.fill(0x80);
        Ok(())
    }

    fn supports_torch(&self) -> bool {
        self.torch
    }

    fn set_torch(&mut self, _on: bool) -> foodgrade_sdk::Result<()> {
        self.log.torch_calls.fetch_add(1, Ordering::SeqCst);
        if self.torch_fails {
            Err(FoodGradeError::DeviceUnavailable("torch busy".to_string()))
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) {
        assert!(!self.stopped, "track stopped twice");
        self.stopped = true;
        self.log.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Decoder that returns `payload` from the `hit_on`-th call onward
/// (1-based), counting every call.
pub fn decoder_hitting_on(
    hit_on: usize,
    payload: &'static str,
    calls: Arc<AtomicUsize>,
) -> impl Fn(&[u8], u32, u32) -> Option<String> {
    move |_pixels: &[u8], _w: u32, _h: u32| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        (n >= hit_on).then(|| payload.to_string())
    }
}
