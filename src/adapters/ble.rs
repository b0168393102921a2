//! BLE status adapter.
//!
//! Implements [`StatusPort`] and [`LinkPort`]: exposes the alarm status
//! byte as a single GATT characteristic and reports central connects and
//! disconnects to the control loop.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via raw `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                                     | Props         |
//! |----------------|------------------------------------------|---------------|
//! | Alarm Status   | `19b10012-e8f2-537e-4f6c-d104768a1214`   | Read+Indicate |
//!
//! The service UUID is `19b10010-e8f2-537e-4f6c-d104768a1214`.  The value
//! is one byte: 0 idle, 1 inside, 2 outside.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use log::{info, warn};

use crate::app::ports::{LinkEvent, LinkPort, StatusPort};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x19b10010_e8f2_537e_4f6c_d104768a1214;
pub const CHAR_STATUS: u128 = 0x19b10012_e8f2_537e_4f6c_d104768a1214;
/// Client Characteristic Configuration Descriptor.
pub const CCCD_UUID16: u16 = 0x2902;
/// CCCD value a central writes to subscribe to indications.
const CCCD_INDICATE: u16 = 0x0002;

/// Link events buffered between Bluedroid callbacks and the control loop.
pub const LINK_QUEUE_DEPTH: usize = 4;

// ── Advertising payloads ──────────────────────────────────────
//
// Legacy advertising carries at most 31 bytes per PDU.  The name goes in
// the advertising data, the 128-bit service UUID in the scan response.

pub const ADV_PAYLOAD_MAX: usize = 31;

/// Flags AD (3) plus the complete-name AD header (2).
pub const fn adv_payload_len(name_len: usize) -> usize {
    3 + 2 + name_len
}

/// One complete 128-bit service UUID list AD.
pub const SCAN_RSP_LEN: usize = 2 + 16;

/// Set while the advertising data is not yet confirmed by Bluedroid.
pub const ADV_DATA_PENDING: u8 = 1 << 0;
/// Set while the scan response is not yet confirmed by Bluedroid.
pub const SCAN_RSP_PENDING: u8 = 1 << 1;

/// Clear `done` from `pending`.  Returns `true` exactly once: when this
/// call cleared the last outstanding payload.
pub fn mark_adv_config_done(pending: &AtomicU8, done: u8) -> bool {
    let prev = pending.fetch_and(!done, AtomicOrdering::AcqRel);
    prev & done != 0 && prev & !done == 0
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// BLE stack bring-up failure.  Carries the raw `esp_err_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    ControllerInit(i32),
    ControllerEnable(i32),
    BluedroidInit(i32),
    BluedroidEnable(i32),
    CallbackRegistration(i32),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControllerInit(e) => write!(f, "BT controller init failed (esp_err={e})"),
            Self::ControllerEnable(e) => write!(f, "BT controller enable failed (esp_err={e})"),
            Self::BluedroidInit(e) => write!(f, "Bluedroid init failed (esp_err={e})"),
            Self::BluedroidEnable(e) => write!(f, "Bluedroid enable failed (esp_err={e})"),
            Self::CallbackRegistration(e) => {
                write!(f, "GAP/GATTS callback registration failed (esp_err={e})")
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32};

#[cfg(target_os = "espidf")]
use crate::error::warn_on_esp_err;

#[cfg(target_os = "espidf")]
static BLE_ADV_CONFIG_PENDING: AtomicU8 = AtomicU8::new(0);

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_INDICATE_ENABLED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_STATUS_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_STATUS_CCCD_HANDLE: AtomicU32 = AtomicU32::new(0);
/// Characteristic value served on GATT reads.
#[cfg(target_os = "espidf")]
static BLE_STATUS_VALUE: AtomicU8 = AtomicU8::new(0);

// GATTS callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.
#[cfg(target_os = "espidf")]
static BLE_LINK_EVENTS: std::sync::Mutex<heapless::Deque<LinkEvent, LINK_QUEUE_DEPTH>> =
    std::sync::Mutex::new(heapless::Deque::new());

/// Advertising parameters shared by start-up and restart-after-disconnect.
#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    }
}

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn push_link_event(event: LinkEvent) {
    if let Ok(mut queue) = BLE_LINK_EVENTS.lock() {
        if queue.is_full() {
            // Keep the newest; the oldest lifecycle event is least useful.
            let _ = queue.pop_front();
        }
        let _ = queue.push_back(event);
    }
}

#[cfg(target_os = "espidf")]
fn restart_advertising() {
    let mut params = adv_params();
    let ret = unsafe { esp_idf_svc::sys::esp_ble_gap_start_advertising(&mut params) };
    warn_on_esp_err("esp_ble_gap_start_advertising", ret);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
            if mark_adv_config_done(&BLE_ADV_CONFIG_PENDING, ADV_DATA_PENDING) {
                restart_advertising();
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_SET_COMPLETE_EVT => {
            if mark_adv_config_done(&BLE_ADV_CONFIG_PENDING, SCAN_RSP_PENDING) {
                restart_advertising();
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // Service declaration + characteristic declaration/value + CCCD.
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 4) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                let mut char_uuid = uuid128_to_esp(CHAR_STATUS);
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    ESP_GATT_PERM_READ as esp_gatt_perm_t,
                    (ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_INDICATE)
                        as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            BLE_STATUS_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: status char (handle={})", handle);
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            let mut descr_uuid = uuid16_to_esp(CCCD_UUID16);
            unsafe {
                esp_ble_gatts_add_char_descr(
                    svc_handle,
                    &mut descr_uuid,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let handle = unsafe { (*param).add_char_descr.attr_handle };
            BLE_STATUS_CCCD_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: status CCCD (handle={}), service ready", handle);
        }
        esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => {
            let p = unsafe { &(*param).read };
            if !p.need_rsp {
                return;
            }
            let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
            unsafe {
                rsp.attr_value.handle = p.handle;
                rsp.attr_value.len = 1;
                rsp.attr_value.value[0] = BLE_STATUS_VALUE.load(AtomicOrdering::Acquire);
                esp_ble_gatts_send_response(
                    gatts_if,
                    p.conn_id,
                    p.trans_id,
                    esp_gatt_status_t_ESP_GATT_OK,
                    &mut rsp,
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if p.handle as u32 == BLE_STATUS_CCCD_HANDLE.load(AtomicOrdering::Relaxed)
                && p.len == 2
            {
                let data = unsafe { core::slice::from_raw_parts(p.value, 2) };
                let cccd = u16::from_le_bytes([data[0], data[1]]);
                BLE_INDICATE_ENABLED.store(cccd & CCCD_INDICATE != 0, AtomicOrdering::Release);
            }
            if p.need_rsp {
                unsafe {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        core::ptr::null_mut(),
                    );
                }
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_CONN_ID.store(p.conn_id as u32, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Release);
            push_link_event(LinkEvent::Connected(crate::app::ports::PeerAddress(
                p.remote_bda,
            )));
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            let p = unsafe { &(*param).disconnect };
            BLE_CONNECTED.store(false, AtomicOrdering::Release);
            BLE_INDICATE_ENABLED.store(false, AtomicOrdering::Release);
            push_link_event(LinkEvent::Disconnected(crate::app::ports::PeerAddress(
                p.remote_bda,
            )));
            restart_advertising();
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    /// Last published status byte.
    status: u8,
    /// Simulation: events injected by tests, drained by `poll`.
    #[cfg(not(target_os = "espidf"))]
    sim_events: heapless::Deque<LinkEvent, LINK_QUEUE_DEPTH>,
    /// Simulation: number of indications that reached a subscribed central.
    #[cfg(not(target_os = "espidf"))]
    sim_indications: u32,
}

impl BleAdapter {
    pub fn new(device_name: heapless::String<24>) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            status: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_events: heapless::Deque::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_indications: 0,
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// The value a GATT read currently returns.
    pub fn status_value(&self) -> u8 {
        self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BleState::Advertising | BleState::Connected)
    }

    /// Bring up the controller and Bluedroid, register the service and
    /// start advertising.  Failure leaves the adapter in `Failed`.
    pub fn start(&mut self) -> Result<(), LinkError> {
        info!("BLE: starting advertising as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    fn track_link(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::Connected(_) => self.state = BleState::Connected,
            LinkEvent::Disconnected(_) => {
                if self.state != BleState::Idle {
                    self.state = BleState::Advertising;
                }
            }
        }
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulation only: take the radio down.  The device firmware has no
    /// shutdown path.
    #[cfg(not(target_os = "espidf"))]
    pub fn stop(&mut self) {
        self.state = BleState::Idle;
        info!("BLE(sim): stopped");
    }

    /// Queue a connection event as if Bluedroid had reported it.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject_link_event(&mut self, event: LinkEvent) {
        if self.sim_events.is_full() {
            let _ = self.sim_events.pop_front();
        }
        let _ = self.sim_events.push_back(event);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_indications(&self) -> u32 {
        self.sim_indications
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;
        unsafe {
            // BLE-only: release classic BT memory.
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                return Err(LinkError::ControllerInit(ret));
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                return Err(LinkError::ControllerEnable(ret));
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                return Err(LinkError::BluedroidInit(ret));
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                return Err(LinkError::BluedroidEnable(ret));
            }

            let ret = esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            if ret != ESP_OK as i32 {
                return Err(LinkError::CallbackRegistration(ret));
            }
            let ret = esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            if ret != ESP_OK as i32 {
                return Err(LinkError::CallbackRegistration(ret));
            }
            let ret = esp_ble_gatts_app_register(0);
            if ret != ESP_OK as i32 {
                return Err(LinkError::CallbackRegistration(ret));
            }

            // The name must be NUL-terminated for the C API.
            let mut name = heapless::Vec::<u8, 25>::new();
            let _ = name.extend_from_slice(self.device_name.as_bytes());
            let _ = name.push(0);
            let ret = esp_ble_gap_set_device_name(name.as_ptr() as *const _);
            warn_on_esp_err("esp_ble_gap_set_device_name", ret);

            // Name in the advertising data, service UUID in the scan
            // response.  Advertising starts from the GAP callback once
            // both are confirmed.
            BLE_ADV_CONFIG_PENDING.store(
                ADV_DATA_PENDING | SCAN_RSP_PENDING,
                AtomicOrdering::Release,
            );
            let mut adv_data = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                min_interval: 0,
                max_interval: 0,
                appearance: 0,
                manufacturer_len: 0,
                p_manufacturer_data: core::ptr::null_mut(),
                service_data_len: 0,
                p_service_data: core::ptr::null_mut(),
                service_uuid_len: 0,
                p_service_uuid: core::ptr::null_mut(),
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
            };
            let ret = esp_ble_gap_config_adv_data(&mut adv_data);
            warn_on_esp_err("esp_ble_gap_config_adv_data", ret);

            let mut svc_uuid = SERVICE_UUID.to_le_bytes();
            let mut scan_rsp = esp_ble_adv_data_t {
                set_scan_rsp: true,
                include_name: false,
                include_txpower: false,
                min_interval: 0,
                max_interval: 0,
                appearance: 0,
                manufacturer_len: 0,
                p_manufacturer_data: core::ptr::null_mut(),
                service_data_len: 0,
                p_service_data: core::ptr::null_mut(),
                service_uuid_len: svc_uuid.len() as u16,
                p_service_uuid: svc_uuid.as_mut_ptr(),
                flag: 0,
            };
            let ret = esp_ble_gap_config_adv_data(&mut scan_rsp);
            warn_on_esp_err("esp_ble_gap_config_adv_data(scan_rsp)", ret);

            info!(
                "BLE(espidf): Bluedroid stack initialized, advertising as '{}'",
                self.device_name
            );
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, status: u8) {
        use esp_idf_svc::sys::*;
        BLE_STATUS_VALUE.store(status, AtomicOrdering::Release);

        let handle = BLE_STATUS_CHAR_HANDLE.load(AtomicOrdering::Relaxed);
        if handle == 0
            || !BLE_CONNECTED.load(AtomicOrdering::Acquire)
            || !BLE_INDICATE_ENABLED.load(AtomicOrdering::Acquire)
        {
            return;
        }
        let mut value = status;
        unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(AtomicOrdering::Relaxed) as u16,
                handle as u16,
                1,
                &mut value,
                true,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, status: u8) {
        if self.state == BleState::Connected {
            self.sim_indications += 1;
        }
        info!("BLE(sim): status 0x{:02x}", status);
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) -> Option<LinkEvent> {
        BLE_LINK_EVENTS.lock().ok().and_then(|mut q| q.pop_front())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) -> Option<LinkEvent> {
        self.sim_events.pop_front()
    }
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl StatusPort for BleAdapter {
    fn publish(&mut self, status: u8) {
        if self.state == BleState::Failed {
            warn!("BLE: publish 0x{:02x} dropped, stack failed", status);
            return;
        }
        self.status = status;
        self.platform_publish(status);
    }
}

impl LinkPort for BleAdapter {
    fn poll(&mut self) -> Option<LinkEvent> {
        let event = self.platform_poll()?;
        self.track_link(&event);
        Some(event)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
