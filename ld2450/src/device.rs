//! High-level device interface

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use ld2450_core::{
    constants::{CHARACTERISTIC_NOTIFY, CHARACTERISTIC_WRITE},
    Command, LinkState, Session,
};
use ld2450_transport::{
    ConnectionProvider, DisconnectCallback, Error as TransportError, ErrorKind, Link, NotifyHandler,
};
use ld2450_types::{
    Area, AreaField, AreaMode, AreaSlot, DeviceConfig, DeviceIdentity, Target, TargetField,
    TargetMode, TargetSlot, TargetState,
};

use crate::{
    callbacks::{CallbackHandle, CallbackRegistry, StateEvent},
    error::{Error, Result},
    options::DeviceOptions,
    pump::{FollowUp, NotificationPump},
    state::StateStore,
    supervisor::{Supervisor, Task},
};

/// HLK-LD2450 radar module
///
/// Owns the link to one module, keeps the latest targets and configuration,
/// and reconnects on its own after an unexpected link loss. Cloning is cheap and every
/// clone drives the same device.
///
/// # Examples
///
/// ```no_run
/// use ld2450::{Device, DeviceIdentity, MemoryProvider, SimulatedRadar, StateEvent};
///
/// #[tokio::main]
/// async fn main() -> ld2450::Result<()> {
///     let provider = MemoryProvider::new().with_simulator(SimulatedRadar::new());
///     let device = Device::new(DeviceIdentity::new("AA:BB:CC:DD:EE:FF"), provider);
///
///     let _handle = device.register_callback(|event| {
///         if let StateEvent::Targets(targets) = event {
///             println!("{}", targets);
///         }
///     });
///
///     device.initialise().await?;
///     println!("Firmware: {}", device.firmware_version());
///
///     device.stop().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Device {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    provider: Arc<dyn ConnectionProvider>,
    identity: RwLock<DeviceIdentity>,
    options: DeviceOptions,
    session: Session,
    link: RwLock<Option<Arc<dyn Link>>>,

    /// Held while establishing a link
    connect_lock: tokio::sync::Mutex<()>,

    /// Held while a command bracket is on the wire
    operation_lock: tokio::sync::Mutex<()>,

    /// Set when we drop the link ourselves, cleared on every connect
    expected_disconnect: AtomicBool,

    state: StateStore,
    callbacks: Arc<CallbackRegistry>,
    pump: NotificationPump,
    supervisor: Mutex<Option<Supervisor>>,
}

impl Device {
    /// Create a device reached through `provider`
    pub fn new<P>(identity: DeviceIdentity, provider: P) -> Self
    where
        P: ConnectionProvider + 'static,
    {
        Self::with_options(identity, provider, DeviceOptions::default())
    }

    pub fn with_options<P>(identity: DeviceIdentity, provider: P, options: DeviceOptions) -> Self
    where
        P: ConnectionProvider + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                provider: Arc::new(provider),
                identity: RwLock::new(identity),
                options,
                session: Session::new(),
                link: RwLock::new(None),
                connect_lock: tokio::sync::Mutex::new(()),
                operation_lock: tokio::sync::Mutex::new(()),
                expected_disconnect: AtomicBool::new(false),
                state: StateStore::default(),
                callbacks: Arc::new(CallbackRegistry::default()),
                pump: NotificationPump::new(),
                supervisor: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn options(&self) -> &DeviceOptions {
        &self.inner.options
    }

    // Lifecycle

    /// Start the background supervisor, connect and read the configuration
    ///
    /// Reads target mode, firmware version, MAC address and areas, in that
    /// order. Safe to call again after [`stop`](Device::stop).
    pub async fn initialise(&self) -> Result<()> {
        self.ensure_supervisor();
        self.setup().await
    }

    /// Stop reconnecting and drop the link
    ///
    /// Waits for an in-flight command bracket to finish first. The next
    /// connection starts the background work again.
    pub async fn stop(&self) -> Result<()> {
        if self.inner.supervisor.lock().take().is_some() {
            debug!("Supervisor shut down");
        }
        self.disconnect().await
    }

    /// Connect without reading the configuration
    ///
    /// Writes made afterwards are still read back.
    pub async fn connect(&self) -> Result<()> {
        self.ensure_connected().await
    }

    /// Drop the link; no reconnect follows
    ///
    /// Waits for an in-flight command bracket to finish first.
    pub async fn disconnect(&self) -> Result<()> {
        let _operation = self.inner.operation_lock.lock().await;
        info!("Disconnecting from {}...", self.inner.identity.read());
        self.execute_disconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
            && self.inner.link.read().as_ref().is_some_and(|link| link.is_connected())
    }

    pub fn link_state(&self) -> LinkState {
        self.inner.session.state()
    }

    /// Successful connections so far
    pub fn connections(&self) -> u32 {
        self.inner.session.connections()
    }

    // Intents

    pub async fn query_target_mode(&self) -> Result<()> {
        self.send_bracket(Command::QueryTargetMode).await
    }

    pub async fn query_firmware_version(&self) -> Result<()> {
        self.send_bracket(Command::ReadFirmwareVersion).await
    }

    pub async fn query_mac_address(&self) -> Result<()> {
        self.send_bracket(Command::ReadMacAddress).await
    }

    pub async fn query_area(&self) -> Result<()> {
        self.send_bracket(Command::QueryArea).await
    }

    /// Switch between single and multi target tracking
    ///
    /// The new mode is read back once the device acknowledges it.
    pub async fn set_target_mode(&self, mode: TargetMode) -> Result<()> {
        let command = match mode {
            TargetMode::Single => Command::EnableSingleTarget,
            TargetMode::Multi => Command::EnableMultiTarget,
            TargetMode::Unset => {
                return Err(Error::InvalidArgument(
                    "target mode must be Single or Multi".into(),
                ))
            }
        };
        self.send_bracket(command).await
    }

    /// Write all three areas and the filter mode
    ///
    /// The areas are read back once the device acknowledges them.
    pub async fn set_area(&self, mode: AreaMode, areas: [Area; 3]) -> Result<()> {
        self.send_bracket(Command::SetArea { mode, areas }).await
    }

    pub async fn reboot(&self) -> Result<()> {
        warn!("Rebooting {}...", self.inner.identity.read());
        self.send_bracket(Command::Reboot).await
    }

    /// Send commands back to back on the wire
    ///
    /// Reconnects first if needed. After a transient or fatal link error the
    /// link is dropped and the whole sequence is sent again, up to
    /// [`DeviceOptions::command_attempts`] times.
    pub async fn send(&self, commands: &[Command]) -> Result<()> {
        let attempts = self.inner.options.command_attempts;
        let mut attempt = 1;

        loop {
            self.ensure_connected().await?;

            match self.send_while_connected(commands).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!("Retrying after {} (attempt {}/{})", e, attempt, attempts);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // State

    pub fn targets(&self) -> TargetState {
        self.inner.state.targets()
    }

    pub fn target(&self, slot: TargetSlot) -> Target {
        *self.targets().target(slot)
    }

    pub fn target_value(&self, slot: TargetSlot, field: TargetField) -> i32 {
        self.targets().value(slot, field)
    }

    pub fn config(&self) -> Arc<DeviceConfig> {
        self.inner.state.config()
    }

    pub fn target_mode(&self) -> TargetMode {
        self.config().target_mode
    }

    pub fn firmware_version(&self) -> String {
        self.config().firmware_version.clone()
    }

    pub fn mac_address(&self) -> String {
        self.config().mac_address.clone()
    }

    pub fn area_mode(&self) -> AreaMode {
        self.config().area_mode
    }

    pub fn area(&self, slot: AreaSlot) -> Area {
        *self.config().area(slot)
    }

    pub fn area_value(&self, slot: AreaSlot, field: AreaField) -> i16 {
        self.config().area_value(slot, field)
    }

    // Identity

    pub fn identity(&self) -> DeviceIdentity {
        self.inner.identity.read().clone()
    }

    pub fn address(&self) -> String {
        self.inner.identity.read().address.clone()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.identity.read().name.clone()
    }

    pub fn rssi(&self) -> Option<i16> {
        self.inner.identity.read().rssi
    }

    /// Replace the identity, e.g. after a fresh advertisement
    ///
    /// Takes effect on the next connection.
    pub fn set_identity(&self, identity: DeviceIdentity) {
        *self.inner.identity.write() = identity;
    }

    // Observers

    /// Observe every telemetry update
    ///
    /// Called on the notification path with the new targets, then with the
    /// current configuration. Must not block.
    pub fn register_callback<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(StateEvent<'_>) + Send + Sync + 'static,
    {
        self.inner.callbacks.register_state(Arc::new(callback))
    }

    /// Observe link loss, expected or not
    pub fn register_disconnected_callback<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.callbacks.register_disconnected(Arc::new(callback))
    }

    // Helper methods

    fn ensure_supervisor(&self) {
        let mut supervisor = self.inner.supervisor.lock();
        if supervisor.as_ref().is_some_and(|s| s.is_running()) {
            return;
        }
        *supervisor = Some(Supervisor::spawn(Arc::downgrade(&self.inner)));
    }

    fn submit(&self, task: Task) {
        let submitted = self
            .inner
            .supervisor
            .lock()
            .as_ref()
            .is_some_and(|s| s.submit(task));
        if !submitted {
            debug!("No supervisor running, dropping {:?}", task);
        }
    }

    /// Connect and read the configuration
    pub(crate) async fn setup(&self) -> Result<()> {
        self.ensure_connected().await?;

        if self.inner.link.read().is_none() {
            debug!("Client is unexpectedly None");
            return Err(Error::NotConnected);
        }

        self.query_target_mode().await?;
        self.query_firmware_version().await?;
        self.query_mac_address().await?;
        self.query_area().await?;

        info!("Initialised: {}", self.config());
        Ok(())
    }

    /// Our own disconnect since the last successful connection
    pub(crate) fn disconnect_requested(&self) -> bool {
        self.inner.expected_disconnect.load(Ordering::Acquire)
    }

    pub(crate) async fn refresh(&self, follow_up: FollowUp) -> Result<()> {
        match follow_up {
            FollowUp::QueryTargetMode => self.query_target_mode().await,
            FollowUp::QueryArea => self.query_area().await,
        }
    }

    async fn send_bracket(&self, command: Command) -> Result<()> {
        debug!("Sending {}", command);
        self.send(&[Command::EnableConfig, command, Command::DisableConfig]).await
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let _connect = match self.inner.connect_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Connection attempt in progress, waiting");
                self.inner.connect_lock.lock().await
            }
        };

        if self.is_connected() {
            return Ok(());
        }

        self.establish().await
    }

    /// Open a link and subscribe to notifications; connect lock held
    async fn establish(&self) -> Result<()> {
        let identity = self.identity();
        info!("Connecting to {}...", identity);

        if self.inner.session.state() == LinkState::Connecting {
            debug!("Recovering from an abandoned connection attempt");
            self.inner.session.close();
        }
        self.inner.session.begin_connect()?;

        // Disconnect callbacks of older links must not tear down this one
        let generation = self.inner.session.connections() + 1;
        let weak = Arc::downgrade(&self.inner);
        let on_disconnect: DisconnectCallback = Arc::new(move || {
            if let Some(device) = Device::upgrade(&weak) {
                device.on_link_lost(generation);
            }
        });

        let link = match self.inner.provider.establish(&identity, on_disconnect).await {
            Ok(link) => link,
            Err(e) => {
                self.inner.session.close();
                return Err(e.into());
            }
        };

        self.inner.pump.reset();
        if let Err(e) = link.start_notify(CHARACTERISTIC_NOTIFY, self.notify_handler()).await {
            self.inner.session.close();
            if let Err(e) = link.disconnect().await {
                debug!("Failed to drop half-open link: {}", e);
            }
            return Err(e.into());
        }

        self.inner.expected_disconnect.store(false, Ordering::Release);
        *self.inner.link.write() = Some(link);
        self.inner.session.mark_connected()?;

        // follow-up reads and reconnects run on the supervisor
        self.ensure_supervisor();

        info!("Connected to {} (connection #{})", identity, generation);
        Ok(())
    }

    fn notify_handler(&self) -> NotifyHandler {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |data: &[u8]| {
            if let Some(device) = Device::upgrade(&weak) {
                device.on_notification(data);
            }
        })
    }

    fn on_notification(&self, data: &[u8]) {
        debug!("Notification: {}", hex::encode(data));

        let inner = &self.inner;
        for follow_up in inner.pump.on_bytes(data, &inner.state, &inner.callbacks) {
            self.submit(Task::Refresh(follow_up));
        }
    }

    fn on_link_lost(&self, generation: u32) {
        if generation != self.inner.session.connections() {
            debug!("Ignoring disconnect of a stale link");
            return;
        }

        self.inner.session.close();
        self.inner.link.write().take();
        self.inner.callbacks.notify_disconnected();

        if self.inner.expected_disconnect.load(Ordering::Acquire) {
            debug!("Disconnected from {}", self.inner.identity.read());
            return;
        }

        warn!("Unexpectedly disconnected from {}, reconnecting", self.inner.identity.read());
        self.submit(Task::Reconnect);
    }

    /// Write under the operation lock, reacting to link errors by kind
    async fn send_while_connected(&self, commands: &[Command]) -> Result<()> {
        let _operation = match self.inner.operation_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Waiting for in-flight command");
                self.inner.operation_lock.lock().await
            }
        };

        let Err(e) = self.write_all(commands).await else {
            return Ok(());
        };

        match e.kind() {
            ErrorKind::NotFound => {
                error!("Device {} not found: {}", self.address(), e);
            }
            ErrorKind::MissingCharacteristic => {
                debug!("{}", e);
            }
            ErrorKind::Transient => {
                warn!("{}, backing off for {:?}", e, self.inner.options.backoff);
                sleep(self.inner.options.backoff).await;
                self.disconnect_after_error().await;
            }
            ErrorKind::Fatal => {
                warn!("{}, dropping link", e);
                self.disconnect_after_error().await;
            }
        }

        Err(e.into())
    }

    async fn write_all(&self, commands: &[Command]) -> ld2450_transport::Result<()> {
        let link = self
            .inner
            .link
            .read()
            .clone()
            .ok_or(TransportError::NotConnected)?;

        for command in commands {
            let frame = command.encode();
            trace!("Writing {}: {}", command, hex::encode(&frame));
            link.write(CHARACTERISTIC_WRITE, &frame).await?;
        }
        Ok(())
    }

    async fn disconnect_after_error(&self) {
        if let Err(e) = self.execute_disconnect().await {
            debug!("Failed to drop link: {}", e);
        }
    }

    /// Drop the link without waiting for the operation lock
    async fn execute_disconnect(&self) -> Result<()> {
        let _connect = self.inner.connect_lock.lock().await;
        self.inner.expected_disconnect.store(true, Ordering::Release);

        let link = self.inner.link.write().take();
        let result = match link {
            Some(link) if link.is_connected() => {
                if let Err(e) = link.stop_notify(CHARACTERISTIC_NOTIFY).await {
                    warn!("Failed to stop notifications: {}", e);
                }
                link.disconnect().await
            }
            _ => Ok(()),
        };

        self.inner.session.close();
        result.map_err(Error::from)
    }
}
