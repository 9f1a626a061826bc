// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::handle::AssetSlot;
use super::{
    file_type, Asset, AssetError, AssetHandle, AssetLoader, AssetLoaderRegistry, AssetSource,
    AssetStore, AssetStoreFactory, LoadRequest,
};
use crate::fatal;
use crate::gpu::GpuManager;
use crate::utils::sync::{lock, read, write};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, Weak};

type Registry = HashMap<String, Weak<dyn Any + Send + Sync>>;

/// State shared by every clone of an [`AssetManager`].
pub(crate) struct ManagerShared {
    gpu: Arc<GpuManager>,
    registry: Mutex<Registry>,
    loaders: RwLock<AssetLoaderRegistry>,
    store_types: RwLock<HashMap<String, Arc<AssetStoreFactory>>>,
    stores: RwLock<HashMap<String, Arc<dyn AssetStore>>>,
}

impl ManagerShared {
    /// Removes the registry entry for `path` if it no longer refers to a
    /// live instance. A live entry belongs to a newer instance created for
    /// the same path and is kept.
    pub(crate) fn unregister(&self, path: &str) {
        let mut registry = lock(&self.registry);
        if registry.get(path).is_some_and(|entry| entry.strong_count() == 0) {
            registry.remove(path);
            log::trace!("Unregistered asset '{}'", path);
        }
    }
}

/// Resolves asset paths to shared asset instances.
///
/// The manager keeps a non-owning registry of every live managed asset, so
/// that looking up a path while a handle to it exists returns that same
/// instance. Asset data is read from mounted [`AssetStore`]s and decoded by
/// the [`AssetLoader`] registered for the file type.
///
/// Cloning the manager is cheap; clones share all state.
#[derive(Clone)]
pub struct AssetManager {
    shared: Arc<ManagerShared>,
}

impl AssetManager {
    /// Creates a manager with no loaders, store types or stores.
    pub fn new(gpu: Arc<GpuManager>) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                gpu,
                registry: Mutex::new(HashMap::new()),
                loaders: RwLock::new(AssetLoaderRegistry::new()),
                store_types: RwLock::new(HashMap::new()),
                stores: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<ManagerShared>) -> Self {
        Self { shared }
    }

    /// GPU manager loaders create resources with.
    pub fn gpu(&self) -> &Arc<GpuManager> {
        &self.shared.gpu
    }

    // --- Loaders ---

    /// Registers a loader for its file type.
    ///
    /// # Fatal errors
    /// * a loader is already registered for the same file type.
    pub fn register_loader<L: AssetLoader>(&self, loader: L) {
        write(&self.shared.loaders).register(loader);
    }

    /// The loader registry.
    pub fn loaders(&self) -> RwLockReadGuard<'_, AssetLoaderRegistry> {
        read(&self.shared.loaders)
    }

    // --- Stores ---

    /// Registers a store type, instantiated by [`mount_store`](Self::mount_store).
    ///
    /// # Fatal errors
    /// * a store type is already registered under `name`.
    pub fn register_store_type<F>(&self, name: &str, factory: F)
    where
        F: Fn(&str) -> Result<Box<dyn AssetStore>, AssetError> + Send + Sync + 'static,
    {
        let mut store_types = write(&self.shared.store_types);
        if store_types.contains_key(name) {
            fatal!("Registering asset store type '{}' that already exists", name);
        }
        let factory: AssetStoreFactory = Box::new(factory);
        store_types.insert(name.to_string(), Arc::new(factory));
        log::debug!("Registered asset store type '{}'", name);
    }

    /// Creates a store of type `store_type` at `location` and mounts it as
    /// `name`.
    ///
    /// # Errors
    /// The store type is unknown, or the factory fails.
    ///
    /// # Fatal errors
    /// * a store is already mounted as `name`.
    pub fn mount_store(
        &self,
        name: &str,
        store_type: &str,
        location: &str,
    ) -> Result<(), AssetError> {
        let factory = read(&self.shared.store_types)
            .get(store_type)
            .cloned()
            .ok_or_else(|| AssetError::UnknownStoreType(store_type.to_string()))?;
        let store = factory(location)?;
        log::info!("Mounting '{}' store at '{}' as '{}'", store_type, location, name);
        self.mount(name, store);
        Ok(())
    }

    /// Mounts an existing store as `name`.
    ///
    /// # Fatal errors
    /// * a store is already mounted as `name`.
    pub fn mount(&self, name: &str, store: impl Into<Arc<dyn AssetStore>>) {
        let mut stores = write(&self.shared.stores);
        if stores.contains_key(name) {
            fatal!("Mounting asset store '{}' that already exists", name);
        }
        stores.insert(name.to_string(), store.into());
    }

    /// Whether a store is mounted as `name`.
    pub fn is_mounted(&self, name: &str) -> bool {
        read(&self.shared.stores).contains_key(name)
    }

    /// Reads the raw data and attributes of the asset at `path`.
    pub fn open(&self, path: &str) -> Result<AssetSource, AssetError> {
        let Some((store_name, relative)) = path.split_once('/') else {
            return Err(AssetError::InvalidPath(path.to_string()));
        };
        if store_name.is_empty() || relative.is_empty() {
            return Err(AssetError::InvalidPath(path.to_string()));
        }

        let store = read(&self.shared.stores)
            .get(store_name)
            .cloned()
            .ok_or_else(|| AssetError::UnknownStore(store_name.to_string()))?;
        store.open(relative)
    }

    // --- Assets ---

    /// Returns the instance for `path`, creating an unloaded one if none is
    /// alive.
    ///
    /// # Fatal errors
    /// * the live instance for `path` is of a different asset type.
    pub fn lookup<A: Asset>(&self, path: &str) -> AssetHandle<A> {
        let existing = {
            let mut registry = lock(&self.shared.registry);
            match registry.get(path).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let slot =
                        Arc::new(AssetSlot::<A>::managed(path, Arc::downgrade(&self.shared)));
                    let erased: Arc<dyn Any + Send + Sync> = slot.clone();
                    registry.insert(path.to_string(), Arc::downgrade(&erased));
                    log::trace!("Registered asset '{}'", path);
                    return AssetHandle::from_slot(slot);
                }
            }
        };

        // Outside the registry lock: dropping the upgraded reference may
        // release the instance, which unregisters itself.
        match existing.downcast::<AssetSlot<A>>() {
            Ok(slot) => AssetHandle::from_slot(slot),
            Err(_) => fatal!("Asset '{}' is not of expected type", path),
        }
    }

    /// Returns the loaded instance for `path`, loading it if necessary.
    ///
    /// # Fatal errors
    /// * the asset cannot be opened;
    /// * no loader handles its file type;
    /// * the loader fails or produces another asset type;
    /// * the live instance for `path` is of a different asset type.
    pub fn load<A: Asset>(&self, path: &str) -> AssetHandle<A> {
        let handle = self.lookup::<A>(path);
        handle.load();
        handle
    }

    /// Whether a live instance exists for `path`.
    pub fn is_cached(&self, path: &str) -> bool {
        lock(&self.shared.registry)
            .get(path)
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    /// Number of live managed instances.
    pub fn cached_count(&self) -> usize {
        lock(&self.shared.registry)
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Reads and decodes the data of the asset at `path`.
    pub(crate) fn load_data<A: Asset>(&self, path: &str) -> A {
        let source = match self.open(path) {
            Ok(source) => source,
            Err(err) => fatal!("Failed to open asset '{}': {}", path, err),
        };

        let Some(file_type) = file_type(path) else {
            fatal!("No loader for file type of asset '{}'", path);
        };
        let Some(loader) = self.loaders().find(file_type) else {
            fatal!("No loader for file type '{}' (asset '{}')", file_type, path);
        };

        let request = LoadRequest {
            path,
            data: &source.data,
            attributes: &source.attributes,
            manager: self,
        };
        let asset = match loader.load_any(&request) {
            Ok(asset) => asset,
            Err(err) => fatal!("Failed to load asset '{}': {}", path, err),
        };

        match asset.downcast::<A>() {
            Ok(asset) => *asset,
            Err(_) => fatal!(
                "Asset '{}' is not of expected type (loader produced {})",
                path,
                loader.asset_type_name()
            ),
        }
    }
}

impl fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetManager")
            .field("cached", &self.cached_count())
            .field("loaders", &*self.loaders())
            .field("stores", &read(&self.shared.stores).keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetAttributes, AssetState, MemoryAssetStore};
    use crate::gpu::mock::mock_manager;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Text(String);
    impl Asset for Text {}

    #[derive(Debug)]
    struct Number(i64);
    impl Asset for Number {}

    /// A pair of texts, the second loaded as a dependency.
    struct Pair {
        first: AssetHandle<Text>,
        second: AssetHandle<Text>,
    }
    impl Asset for Pair {}

    #[derive(Default)]
    struct TextLoader {
        loads: Arc<AtomicUsize>,
    }

    impl AssetLoader for TextLoader {
        type Asset = Text;

        fn file_type(&self) -> &str {
            "txt"
        }

        fn load(&self, request: &LoadRequest<'_>) -> Result<Text, AssetError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let mut text = String::from_utf8(request.data.to_vec()).map_err(AssetError::load)?;
            if let Some(suffix) = request.attributes.get_str("suffix") {
                text.push_str(suffix);
            }
            Ok(Text(text))
        }
    }

    struct NumberLoader;

    impl AssetLoader for NumberLoader {
        type Asset = Number;

        fn file_type(&self) -> &str {
            "num"
        }

        fn load(&self, request: &LoadRequest<'_>) -> Result<Number, AssetError> {
            let text = std::str::from_utf8(request.data).map_err(AssetError::load)?;
            text.trim().parse().map(Number).map_err(AssetError::load)
        }
    }

    struct PairLoader;

    impl AssetLoader for PairLoader {
        type Asset = Pair;

        fn file_type(&self) -> &str {
            "pair"
        }

        fn load(&self, request: &LoadRequest<'_>) -> Result<Pair, AssetError> {
            let text = std::str::from_utf8(request.data).map_err(AssetError::load)?;
            let (first, second) = text
                .split_once('\n')
                .ok_or_else(|| AssetError::load("pair needs two lines"))?;
            Ok(Pair {
                first: request.manager.load(first),
                second: request.manager.load(second),
            })
        }
    }

    fn manager() -> (AssetManager, Arc<MemoryAssetStore>, Arc<AtomicUsize>) {
        let (_device, gpu) = mock_manager();
        let manager = AssetManager::new(Arc::new(gpu));
        let loads = Arc::new(AtomicUsize::new(0));
        manager.register_loader(TextLoader { loads: loads.clone() });
        manager.register_loader(NumberLoader);
        manager.register_loader(PairLoader);

        let store = Arc::new(MemoryAssetStore::new());
        store.insert("hello.txt", "hello");
        store.insert_with_attributes(
            "excited.txt",
            "hello",
            AssetAttributes::new().with("suffix", "!"),
        );
        store.insert("answer.num", "42");
        store.insert("broken.num", "forty-two");
        store.insert("both.pair", "mem/hello.txt\nmem/excited.txt");
        store.insert("data.bin", vec![0u8, 1, 2]);
        manager.mount("mem", store.clone() as Arc<dyn AssetStore>);
        (manager, store, loads)
    }

    #[test]
    fn load_returns_loaded_asset() {
        let (manager, _store, _loads) = manager();

        let text = manager.load::<Text>("mem/hello.txt");

        assert!(text.is_managed());
        assert_eq!(text.path(), Some("mem/hello.txt"));
        assert_eq!(text.state(), AssetState::Loaded);
        assert_eq!(text.read().0, "hello");
        assert_eq!(manager.load::<Text>("mem/excited.txt").read().0, "hello!");
    }

    #[test]
    fn repeated_load_returns_same_instance_while_held() {
        let (manager, _store, loads) = manager();

        let first = manager.load::<Text>("mem/hello.txt");
        let second = manager.load::<Text>("mem/hello.txt");

        assert!(AssetHandle::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(manager.cached_count(), 1);
    }

    #[test]
    fn dropping_last_handle_unregisters_the_asset() {
        let (manager, _store, loads) = manager();

        let handle = manager.load::<Text>("mem/hello.txt");
        let clone = handle.clone();
        drop(handle);
        assert!(manager.is_cached("mem/hello.txt"));

        drop(clone);
        assert!(!manager.is_cached("mem/hello.txt"));
        assert_eq!(manager.cached_count(), 0);

        let reloaded = manager.load::<Text>("mem/hello.txt");
        assert!(reloaded.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lookup_creates_an_unloaded_instance() {
        let (manager, _store, loads) = manager();

        let handle = manager.lookup::<Text>("mem/hello.txt");
        assert_eq!(handle.state(), AssetState::Unloaded);
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert!(manager.is_cached("mem/hello.txt"));

        handle.load();
        assert!(handle.is_loaded());
    }

    #[test]
    fn unload_keeps_identity_and_allows_reload() {
        let (manager, store, loads) = manager();

        let handle = manager.load::<Text>("mem/hello.txt");
        handle.unload();
        assert_eq!(handle.state(), AssetState::Unloaded);
        assert!(manager.is_cached("mem/hello.txt"));

        store.insert("hello.txt", "changed");
        let again = manager.load::<Text>("mem/hello.txt");
        assert!(AssetHandle::ptr_eq(&handle, &again));
        assert_eq!(handle.read().0, "changed");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unloading_an_unloaded_asset_is_a_no_op() {
        let (manager, _store, _loads) = manager();
        let handle = manager.lookup::<Text>("mem/hello.txt");
        handle.unload();
        assert_eq!(handle.state(), AssetState::Unloaded);
    }

    #[test]
    fn loaders_can_load_dependencies() {
        let (manager, _store, _loads) = manager();

        let hello = manager.load::<Text>("mem/hello.txt");
        let pair = manager.load::<Pair>("mem/both.pair");

        let pair = pair.read();
        assert!(AssetHandle::ptr_eq(&pair.first, &hello));
        assert_eq!(pair.second.read().0, "hello!");
        assert_eq!(manager.cached_count(), 3);
    }

    #[test]
    fn dropping_an_asset_releases_its_dependencies() {
        let (manager, _store, _loads) = manager();

        let pair = manager.load::<Pair>("mem/both.pair");
        assert_eq!(manager.cached_count(), 3);
        drop(pair);
        assert_eq!(manager.cached_count(), 0);
    }

    #[test]
    #[should_panic(expected = "Asset 'mem/hello.txt' is not loaded")]
    fn reading_unloaded_asset_is_fatal() {
        let (manager, _store, _loads) = manager();
        let handle = manager.lookup::<Text>("mem/hello.txt");
        let _data = handle.read();
    }

    #[test]
    #[should_panic(expected = "Asset 'mem/hello.txt' is not of expected type")]
    fn cached_asset_of_another_type_is_fatal() {
        let (manager, _store, _loads) = manager();
        let _text = manager.load::<Text>("mem/hello.txt");
        manager.lookup::<Number>("mem/hello.txt");
    }

    #[test]
    #[should_panic(expected = "Asset 'mem/answer.num' is not of expected type")]
    fn loader_of_another_type_is_fatal() {
        let (manager, _store, _loads) = manager();
        manager.load::<Text>("mem/answer.num");
    }

    #[test]
    #[should_panic(expected = "No loader for file type 'bin'")]
    fn unknown_file_type_is_fatal() {
        let (manager, _store, _loads) = manager();
        manager.load::<Text>("mem/data.bin");
    }

    #[test]
    #[should_panic(expected = "Failed to open asset 'mem/missing.txt'")]
    fn missing_asset_is_fatal() {
        let (manager, _store, _loads) = manager();
        manager.load::<Text>("mem/missing.txt");
    }

    #[test]
    #[should_panic(expected = "Failed to load asset 'mem/broken.num'")]
    fn loader_failure_is_fatal() {
        let (manager, _store, _loads) = manager();
        manager.load::<Number>("mem/broken.num");
    }

    #[test]
    fn open_resolves_store_by_first_component() {
        let (manager, _store, _loads) = manager();

        assert_eq!(manager.open("mem/answer.num").unwrap().data, b"42");
        assert!(matches!(
            manager.open("other/answer.num"),
            Err(AssetError::UnknownStore(name)) if name == "other"
        ));
        assert!(matches!(manager.open("answer.num"), Err(AssetError::InvalidPath(_))));
        assert!(matches!(manager.open("mem/"), Err(AssetError::InvalidPath(_))));
    }

    #[test]
    fn mount_store_instantiates_registered_type() {
        let (manager, _store, _loads) = manager();
        manager.register_store_type("memory", |location| {
            let store = MemoryAssetStore::new();
            store.insert("location.txt", location.to_string());
            Ok(Box::new(store) as Box<dyn AssetStore>)
        });

        manager.mount_store("extra", "memory", "somewhere").unwrap();
        assert!(manager.is_mounted("extra"));
        assert_eq!(manager.load::<Text>("extra/location.txt").read().0, "somewhere");

        assert!(matches!(
            manager.mount_store("nope", "zip", "a.zip"),
            Err(AssetError::UnknownStoreType(name)) if name == "zip"
        ));
    }

    #[test]
    #[should_panic(expected = "Mounting asset store 'mem' that already exists")]
    fn duplicate_mount_is_fatal() {
        let (manager, _store, _loads) = manager();
        manager.mount("mem", Arc::new(MemoryAssetStore::new()) as Arc<dyn AssetStore>);
    }

    #[test]
    fn handles_can_be_loaded_across_threads() {
        let (manager, _store, loads) = manager();
        let handle = manager.lookup::<Text>("mem/hello.txt");

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let handle = handle.clone();
                scope.spawn(move || handle.load());
            }
        });

        assert!(handle.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
