use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::types::CaptureEvent;

/// Character of the capture key, for help text and log messages.
pub const CAPTURE_KEY: char = '0';

/// Handle to the global capture-key observer thread.
pub struct KeyListener {
    thread: Option<JoinHandle<()>>,
    stopper: Option<Stopper>,
}

impl KeyListener {
    fn inactive() -> Self {
        Self { thread: None, stopper: None }
    }

    pub fn is_active(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the observer loop and wait for its thread.
    pub fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stopper) = self.stopper.take() {
            stopper.stop();
        }
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Emit `event` if capture mode is on. Called from the OS callback thread.
fn publish(capturing: &AtomicBool, tx: &mpsc::Sender<CaptureEvent>, event: CaptureEvent) {
    if capturing.load(Ordering::Acquire) {
        tx.send(event).ok();
    }
}

// ---------------------------------------------------------------- macOS

#[cfg(target_os = "macos")]
struct Stopper(usize); // CFRunLoopRef of the listener thread

#[cfg(target_os = "macos")]
impl Stopper {
    fn stop(self) {
        use core_foundation::base::TCFType;
        use core_foundation::runloop::{CFRunLoop, CFRunLoopRef};
        let rl = unsafe { CFRunLoop::wrap_under_get_rule(self.0 as CFRunLoopRef) };
        rl.stop();
    }
}

/// Start a background thread that watches for the capture key ('0').
/// While `capturing` is set, each press samples the pointer and sends
/// `CaptureEvent::PositionCaptured` on `tx`.
#[cfg(target_os = "macos")]
pub fn start_capture_listener(
    capturing: Arc<AtomicBool>,
    tx: mpsc::Sender<CaptureEvent>,
) -> KeyListener {
    use std::ffi::c_void;
    use std::sync::atomic::AtomicPtr;

    use core_foundation::base::TCFType;
    use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};

    use crate::types::Coordinate;

    // CGEventTap FFI types and functions
    type CGEventTapProxy = *mut c_void;
    type CGEventRef = *mut c_void;
    type CFMachPortRef = *mut c_void;
    type CGEventMask = u64;
    type CGEventType = u32;
    type CGEventFlags = u64;

    #[repr(C)]
    struct CGPoint {
        x: f64,
        y: f64,
    }

    type CGEventTapCallBack = unsafe extern "C" fn(
        CGEventTapProxy,
        CGEventType,
        CGEventRef,
        *mut c_void,
    ) -> CGEventRef;

    const K_CG_HID_EVENT_TAP: u32 = 0;
    const K_CG_HEAD_INSERT_EVENT_TAP: u32 = 0;
    const K_CG_EVENT_TAP_OPTION_LISTEN_ONLY: u32 = 1;
    const CG_EVENT_KEY_DOWN: u32 = 10;
    const CG_EVENT_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFFFFFE;
    const K_CG_KEYBOARD_EVENT_KEYCODE: u32 = 9;
    const K_CG_KEYBOARD_EVENT_AUTOREPEAT: u32 = 8;

    const K_CG_EVENT_FLAG_MASK_COMMAND: u64 = 0x00100000;
    const K_CG_EVENT_FLAG_MASK_CONTROL: u64 = 0x00040000;

    const KEYCODE_0: i64 = 29; // kVK_ANSI_0

    extern "C" {
        fn CGEventTapCreate(
            tap: u32,
            place: u32,
            options: u32,
            events_of_interest: CGEventMask,
            callback: CGEventTapCallBack,
            user_info: *mut c_void,
        ) -> CFMachPortRef;

        fn CFMachPortCreateRunLoopSource(
            allocator: *const c_void,
            port: CFMachPortRef,
            order: i64,
        ) -> core_foundation::runloop::CFRunLoopSourceRef;

        fn CFMachPortInvalidate(port: CFMachPortRef);
        fn CFRelease(cf: *const c_void);

        fn CGEventGetFlags(event: CGEventRef) -> CGEventFlags;
        fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
        fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
        fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    }

    struct TapContext {
        capturing: Arc<AtomicBool>,
        tx: mpsc::Sender<CaptureEvent>,
        tap: AtomicPtr<c_void>,
    }

    unsafe extern "C" fn capture_callback(
        _proxy: CGEventTapProxy,
        event_type: CGEventType,
        event: CGEventRef,
        user_info: *mut c_void,
    ) -> CGEventRef {
        unsafe {
            let ctx = &*(user_info as *const TapContext);

            // The system disables slow taps; turn ours back on
            if event_type == CG_EVENT_TAP_DISABLED_BY_TIMEOUT {
                let tap = ctx.tap.load(Ordering::Acquire);
                if !tap.is_null() {
                    CGEventTapEnable(tap, true);
                }
                return event;
            }

            if event_type != CG_EVENT_KEY_DOWN {
                return event;
            }

            let keycode = CGEventGetIntegerValueField(event, K_CG_KEYBOARD_EVENT_KEYCODE);
            let repeat = CGEventGetIntegerValueField(event, K_CG_KEYBOARD_EVENT_AUTOREPEAT) != 0;
            let flags = CGEventGetFlags(event);
            let no_cmd = (flags & K_CG_EVENT_FLAG_MASK_COMMAND) == 0;
            let no_ctrl = (flags & K_CG_EVENT_FLAG_MASK_CONTROL) == 0;

            if keycode == KEYCODE_0 && !repeat && no_cmd && no_ctrl {
                let p = CGEventGetLocation(event);
                let at = Coordinate::new(p.x.round() as i32, p.y.round() as i32);
                publish(&ctx.capturing, &ctx.tx, CaptureEvent::PositionCaptured(at));
            }

            event
        }
    }

    let (ready_tx, ready_rx) = mpsc::channel::<Option<usize>>();

    let thread = std::thread::spawn(move || {
        let ctx = Box::new(TapContext { capturing, tx, tap: AtomicPtr::new(std::ptr::null_mut()) });
        let ctx_ptr = Box::into_raw(ctx);

        unsafe {
            let mask: CGEventMask = 1 << CG_EVENT_KEY_DOWN;
            let tap = CGEventTapCreate(
                K_CG_HID_EVENT_TAP,
                K_CG_HEAD_INSERT_EVENT_TAP,
                K_CG_EVENT_TAP_OPTION_LISTEN_ONLY,
                mask,
                capture_callback,
                ctx_ptr as *mut c_void,
            );

            if tap.is_null() {
                crate::logger::error(
                    "failed to create event tap for the capture key, \
                     grant Accessibility permission to your terminal",
                );
                drop(Box::from_raw(ctx_ptr));
                ready_tx.send(None).ok();
                return;
            }
            (*ctx_ptr).tap.store(tap, Ordering::Release);

            let source = CFRunLoopSource::wrap_under_create_rule(
                CFMachPortCreateRunLoopSource(std::ptr::null(), tap, 0),
            );
            let run_loop = CFRunLoop::get_current();
            run_loop.add_source(&source, kCFRunLoopCommonModes);
            CGEventTapEnable(tap, true);

            ready_tx.send(Some(run_loop.as_concrete_TypeRef() as usize)).ok();
            crate::logger::info("capture key listener started");

            CFRunLoop::run_current(); // returns on CFRunLoopStop

            CGEventTapEnable(tap, false);
            run_loop.remove_source(&source, kCFRunLoopCommonModes);
            CFMachPortInvalidate(tap);
            CFRelease(tap as *const c_void);
            drop(Box::from_raw(ctx_ptr));
        }
    });

    match ready_rx.recv() {
        Ok(Some(rl)) => KeyListener { thread: Some(thread), stopper: Some(Stopper(rl)) },
        _ => {
            thread.join().ok();
            KeyListener::inactive()
        }
    }
}

// ---------------------------------------------------------------- Windows

#[cfg(target_os = "windows")]
struct Stopper(u32); // listener thread id

#[cfg(target_os = "windows")]
impl Stopper {
    fn stop(self) {
        const WM_QUIT: u32 = 0x0012;
        extern "system" {
            fn PostThreadMessageW(thread_id: u32, msg: u32, w_param: usize, l_param: isize) -> i32;
        }
        unsafe {
            PostThreadMessageW(self.0, WM_QUIT, 0, 0);
        }
    }
}

#[cfg(target_os = "windows")]
struct HookContext {
    capturing: Arc<AtomicBool>,
    tx: mpsc::Sender<CaptureEvent>,
}

// Low-level hooks carry no user data, so the callback reads this
#[cfg(target_os = "windows")]
static HOOK_CTX: std::sync::Mutex<Option<HookContext>> = std::sync::Mutex::new(None);

/// Start a background thread that watches for the capture key ('0' or numpad 0).
/// While `capturing` is set, each press samples the pointer and sends
/// `CaptureEvent::PositionCaptured` on `tx`.
#[cfg(target_os = "windows")]
pub fn start_capture_listener(
    capturing: Arc<AtomicBool>,
    tx: mpsc::Sender<CaptureEvent>,
) -> KeyListener {
    use std::ffi::c_void;

    type HHOOK = *mut c_void;
    type HWND = *mut c_void;
    type BOOL = i32;
    type UINT = u32;
    type WPARAM = usize;
    type LPARAM = isize;
    type LRESULT = isize;
    type DWORD = u32;
    type LONG = i32;

    #[repr(C)]
    struct POINT {
        x: LONG,
        y: LONG,
    }

    #[repr(C)]
    struct MSG {
        hwnd: HWND,
        message: UINT,
        w_param: WPARAM,
        l_param: LPARAM,
        time: DWORD,
        pt: POINT,
    }

    #[repr(C)]
    struct KBDLLHOOKSTRUCT {
        vk_code: DWORD,
        scan_code: DWORD,
        flags: DWORD,
        time: DWORD,
        extra_info: usize,
    }

    const WH_KEYBOARD_LL: i32 = 13;
    const HC_ACTION: i32 = 0;
    const WM_KEYDOWN: usize = 0x0100;
    const PM_NOREMOVE: UINT = 0;
    const VK_0: DWORD = 0x30;
    const VK_NUMPAD0: DWORD = 0x60;

    extern "system" {
        fn SetWindowsHookExW(
            id_hook: i32,
            hook_proc: unsafe extern "system" fn(i32, WPARAM, LPARAM) -> LRESULT,
            hmod: *mut c_void,
            thread_id: DWORD,
        ) -> HHOOK;
        fn CallNextHookEx(hhk: HHOOK, code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT;
        fn UnhookWindowsHookEx(hhk: HHOOK) -> BOOL;
        fn GetMessageW(msg: *mut MSG, hwnd: HWND, msg_filter_min: UINT, msg_filter_max: UINT) -> BOOL;
        fn PeekMessageW(
            msg: *mut MSG,
            hwnd: HWND,
            msg_filter_min: UINT,
            msg_filter_max: UINT,
            remove: UINT,
        ) -> BOOL;
        fn GetCurrentThreadId() -> DWORD;
    }

    unsafe extern "system" fn keyboard_proc(code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
        unsafe {
            if code == HC_ACTION && w_param == WM_KEYDOWN {
                let info = &*(l_param as *const KBDLLHOOKSTRUCT);
                if info.vk_code == VK_0 || info.vk_code == VK_NUMPAD0 {
                    if let Ok(guard) = HOOK_CTX.lock() {
                        if let Some(ctx) = guard.as_ref() {
                            match super::win32::current_location() {
                                Ok(at) => publish(
                                    &ctx.capturing,
                                    &ctx.tx,
                                    CaptureEvent::PositionCaptured(at),
                                ),
                                Err(e) => crate::logger::error(&format!("capture failed: {}", e)),
                            }
                        }
                    }
                }
            }
            CallNextHookEx(std::ptr::null_mut(), code, w_param, l_param)
        }
    }

    if let Ok(mut guard) = HOOK_CTX.lock() {
        *guard = Some(HookContext { capturing, tx });
    }

    let (ready_tx, ready_rx) = mpsc::channel::<Option<u32>>();

    let thread = std::thread::spawn(move || {
        unsafe {
            let mut msg: MSG = std::mem::zeroed();
            // Create this thread's message queue before anyone posts WM_QUIT to it
            PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_NOREMOVE);

            let hook = SetWindowsHookExW(WH_KEYBOARD_LL, keyboard_proc, std::ptr::null_mut(), 0);
            if hook.is_null() {
                crate::logger::error("failed to install keyboard hook for the capture key");
                ready_tx.send(None).ok();
                return;
            }

            ready_tx.send(Some(GetCurrentThreadId())).ok();
            crate::logger::info("capture key listener started");

            // GetMessageW blocks until a message arrives; returns 0 on WM_QUIT
            while GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) > 0 {}

            UnhookWindowsHookEx(hook);
        }
        if let Ok(mut guard) = HOOK_CTX.lock() {
            *guard = None;
        }
    });

    match ready_rx.recv() {
        Ok(Some(tid)) => KeyListener { thread: Some(thread), stopper: Some(Stopper(tid)) },
        _ => {
            thread.join().ok();
            KeyListener::inactive()
        }
    }
}

// ---------------------------------------------------------------- other

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
struct Stopper;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
impl Stopper {
    fn stop(self) {}
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn start_capture_listener(
    _capturing: Arc<AtomicBool>,
    _tx: mpsc::Sender<CaptureEvent>,
) -> KeyListener {
    crate::logger::warn(&format!(
        "global capture key not supported on this platform, press '{}' in the terminal",
        CAPTURE_KEY
    ));
    KeyListener::inactive()
}
