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

use super::manager::{AssetManager, ManagerShared};
use super::{Asset, AssetState};
use crate::fatal;
use crate::utils::sync::{lock, read, write};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Shared state behind every handle to one asset instance.
pub(crate) struct AssetSlot<A: Asset> {
    path: Option<String>,
    manager: Weak<ManagerShared>,
    state: Mutex<AssetState>,
    data: RwLock<Option<A>>,
}

impl<A: Asset> AssetSlot<A> {
    pub(crate) fn managed(path: &str, manager: Weak<ManagerShared>) -> Self {
        Self {
            path: Some(path.to_string()),
            manager,
            state: Mutex::new(AssetState::Unloaded),
            data: RwLock::new(None),
        }
    }
}

impl<A: Asset> Drop for AssetSlot<A> {
    fn drop(&mut self) {
        if let (Some(path), Some(shared)) = (&self.path, self.manager.upgrade()) {
            shared.unregister(path);
        }
    }
}

/// A thread-safe, reference-counted handle to an asset.
///
/// Cloning a handle is cheap and yields another reference to the same
/// instance. The instance is destroyed when the last handle is dropped; a
/// managed instance first removes itself from its manager's registry.
///
/// A managed handle starts out [`Unloaded`](AssetState::Unloaded) and moves
/// between states only through [`load`](Self::load) and
/// [`unload`](Self::unload). An unmanaged handle is always loaded.
pub struct AssetHandle<A: Asset>(Arc<AssetSlot<A>>);

impl<A: Asset> AssetHandle<A> {
    /// Creates an unmanaged handle owning `asset`.
    pub fn new(asset: A) -> Self {
        Self(Arc::new(AssetSlot {
            path: None,
            manager: Weak::new(),
            state: Mutex::new(AssetState::Loaded),
            data: RwLock::new(Some(asset)),
        }))
    }

    pub(crate) fn from_slot(slot: Arc<AssetSlot<A>>) -> Self {
        Self(slot)
    }

    /// Path of a managed asset.
    pub fn path(&self) -> Option<&str> {
        self.0.path.as_deref()
    }

    /// Whether the asset was created by an [`AssetManager`].
    pub fn is_managed(&self) -> bool {
        self.0.path.is_some()
    }

    /// Current load state.
    pub fn state(&self) -> AssetState {
        *lock(&self.0.state)
    }

    /// Whether the asset data is in memory.
    pub fn is_loaded(&self) -> bool {
        self.state() == AssetState::Loaded
    }

    /// Loads the asset data if it is not already loaded (or loading).
    ///
    /// # Fatal errors
    /// Any failure to load the data, see [`AssetManager::load`].
    pub fn load(&self) {
        let Some(path) = self.0.path.as_deref() else {
            return;
        };

        {
            let mut state = lock(&self.0.state);
            if *state != AssetState::Unloaded {
                return;
            }
            *state = AssetState::Loading;
        }

        let Some(shared) = self.0.manager.upgrade() else {
            fatal!("Asset '{}' outlived its manager", path);
        };

        log::debug!("Loading asset '{}'", path);
        let asset = AssetManager::from_shared(shared).load_data::<A>(path);
        *write(&self.0.data) = Some(asset);
        *lock(&self.0.state) = AssetState::Loaded;
        log::info!("Loaded asset '{}'", path);
    }

    /// Frees the asset data. The instance stays registered with its manager
    /// while handles to it exist, and can be loaded again.
    ///
    /// # Fatal errors
    /// * the asset is unmanaged.
    pub fn unload(&self) {
        let Some(path) = self.0.path.as_deref() else {
            fatal!("Cannot unload an unmanaged asset");
        };

        let data = {
            let mut state = lock(&self.0.state);
            if *state != AssetState::Loaded {
                return;
            }
            *state = AssetState::Unloaded;
            write(&self.0.data).take()
        };

        // Dropped outside the state lock: the data may hold the last
        // handles to other assets.
        drop(data);
        log::debug!("Unloaded asset '{}'", path);
    }

    /// Shared access to the asset data.
    ///
    /// # Fatal errors
    /// * the asset is not loaded.
    pub fn read(&self) -> AssetReadGuard<'_, A> {
        let guard = read(&self.0.data);
        if guard.is_none() {
            fatal!("Asset '{}' is not loaded", self.display_path());
        }
        AssetReadGuard(guard)
    }

    /// Exclusive access to the asset data.
    ///
    /// # Fatal errors
    /// * the asset is not loaded.
    pub fn write(&self) -> AssetWriteGuard<'_, A> {
        let guard = write(&self.0.data);
        if guard.is_none() {
            fatal!("Asset '{}' is not loaded", self.display_path());
        }
        AssetWriteGuard(guard)
    }

    /// Whether two handles refer to the same instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Number of handles to this instance.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    fn display_path(&self) -> &str {
        self.path().unwrap_or("<unmanaged>")
    }
}

impl<A: Asset> Clone for AssetHandle<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Asset> fmt::Debug for AssetHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("type", &std::any::type_name::<A>())
            .field("path", &self.path())
            .field("state", &self.state())
            .finish()
    }
}

/// Shared access to loaded asset data.
pub struct AssetReadGuard<'a, A>(RwLockReadGuard<'a, Option<A>>);

impl<A> Deref for AssetReadGuard<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        match self.0.as_ref() {
            Some(asset) => asset,
            None => unreachable!("guard created over unloaded asset"),
        }
    }
}

/// Exclusive access to loaded asset data.
pub struct AssetWriteGuard<'a, A>(RwLockWriteGuard<'a, Option<A>>);

impl<A> Deref for AssetWriteGuard<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        match self.0.as_ref() {
            Some(asset) => asset,
            None => unreachable!("guard created over unloaded asset"),
        }
    }
}

impl<A> DerefMut for AssetWriteGuard<'_, A> {
    fn deref_mut(&mut self) -> &mut A {
        match self.0.as_mut() {
            Some(asset) => asset,
            None => unreachable!("guard created over unloaded asset"),
        }
    }
}
