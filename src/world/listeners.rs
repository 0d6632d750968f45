use parking_lot::RwLock;

/// Callback invoked with the world that changed.
pub type Listener<W> = Box<dyn Fn(&W) + Send + Sync>;

/// Fan-out of change notifications for one world.
///
/// Worlds call [`Listeners::notify`] only after releasing their own state
/// lock, so a callback may read the world it is handed. Callbacks run on the
/// mutating thread and must not block or subscribe from inside a callback.
pub struct Listeners<W> {
    callbacks: RwLock<Vec<Listener<W>>>,
}

impl<W> Listeners<W> {
    pub fn new() -> Self {
        Listeners {
            callbacks: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&W) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Box::new(callback));
    }

    pub fn notify(&self, world: &W) {
        for callback in self.callbacks.read().iter() {
            callback(world);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<W> Default for Listeners<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> std::fmt::Debug for Listeners<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}
