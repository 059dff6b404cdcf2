//! Win32 surface enumeration
//!
//! This module is responsible for:
//! - Enumerating top-level windows in z-order (topmost first)
//! - Reading each window's bounds, title, owning process and opacity
//! - Classifying shell windows (taskbar, desktop) as system chrome
//!
//! `EnumWindows` already walks windows front to back, so the enumeration
//! order is used as the stacking order without further sorting.

use std::collections::HashMap;
use std::ffi::c_void;
use std::path::Path;

use log::{debug, trace};
use windows::core::PWSTR;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Dwm::*;
use windows::Win32::System::Threading::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::domain::core::Rect;
use crate::domain::surface::{ProcessId, SurfaceDescriptor, SurfaceId, NORMAL_LAYER};
use crate::platform::{ProviderError, SurfaceProvider};

/// Layer assigned to taskbar and desktop shell windows
pub const SHELL_LAYER: i32 = 1;

/// Window classes owned by the shell rather than by applications
const SHELL_CLASSES: &[&str] = &[
    "Shell_TrayWnd",
    "Shell_SecondaryTrayWnd",
    "Progman",
    "WorkerW",
];

/// Provider reading the live Win32 window list
#[derive(Debug, Clone, Default)]
pub struct Win32Provider;

impl Win32Provider {
    pub fn new() -> Self {
        Self
    }
}

impl SurfaceProvider for Win32Provider {
    fn all_surfaces(&self) -> Result<Vec<SurfaceDescriptor>, ProviderError> {
        let handles = enumerate_top_level_windows()?;
        let mut owner_names: HashMap<u32, Option<String>> = HashMap::new();

        let surfaces: Vec<SurfaceDescriptor> = handles
            .into_iter()
            .enumerate()
            .map(|(z_index, hwnd)| describe_window(hwnd, z_index, &mut owner_names))
            .collect();

        debug!("Enumerated {} top-level windows", surfaces.len());
        Ok(surfaces)
    }
}

/// Context for window enumeration callback
struct EnumContext {
    handles: Vec<HWND>,
}

/// Callback collecting every top-level window handle
unsafe extern "system" fn enum_window_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    unsafe {
        let context = &mut *(lparam.0 as *mut EnumContext);
        context.handles.push(hwnd);
        TRUE // Continue enumeration
    }
}

/// Returns top-level windows front to back
fn enumerate_top_level_windows() -> Result<Vec<HWND>, ProviderError> {
    let mut context = EnumContext {
        handles: Vec::new(),
    };

    unsafe {
        EnumWindows(
            Some(enum_window_proc),
            LPARAM(&mut context as *mut _ as isize),
        )
        .map_err(|err| ProviderError::System {
            code: err.code().0,
            context: "enumerating top-level windows".to_string(),
        })?;
    }

    Ok(context.handles)
}

/// Builds a descriptor for one window
///
/// Individual attribute queries fall back to neutral values rather than
/// failing the whole snapshot; a window can close mid-enumeration.
fn describe_window(
    hwnd: HWND,
    z_index: usize,
    owner_names: &mut HashMap<u32, Option<String>>,
) -> SurfaceDescriptor {
    let frame = window_frame(hwnd).unwrap_or(Rect::NULL);
    let process = window_process_id(hwnd);
    let owner_name = owner_names
        .entry(process)
        .or_insert_with(|| process_image_name(process))
        .clone();
    let class_name = window_class_name(hwnd);
    let layer = if SHELL_CLASSES.contains(&class_name.as_str()) {
        SHELL_LAYER
    } else {
        NORMAL_LAYER
    };

    let descriptor = SurfaceDescriptor {
        id: hwnd_to_surface_id(hwnd),
        process_id: ProcessId(process),
        owner_name,
        title: window_title(hwnd),
        frame,
        layer,
        opacity: window_opacity(hwnd),
        is_on_screen: is_window_on_screen(hwnd),
        z_index,
    };

    trace!("{:?} class {}", descriptor, class_name);
    descriptor
}

/// Converts a window handle to a surface identifier
pub fn hwnd_to_surface_id(hwnd: HWND) -> SurfaceId {
    SurfaceId(hwnd.0 as u64)
}

/// Converts a surface identifier back to a window handle
pub fn surface_id_to_hwnd(id: SurfaceId) -> HWND {
    HWND(id.0 as isize)
}

/// Converts a Windows RECT to a domain rectangle
pub fn win32_rect_to_rect(rect: &RECT) -> Rect {
    Rect::from_edges(
        rect.left as f64,
        rect.top as f64,
        rect.right as f64,
        rect.bottom as f64,
    )
}

/// Visible window bounds
///
/// DWM extended frame bounds exclude the invisible resize border that
/// `GetWindowRect` includes; the latter is the fallback when DWM has no
/// answer (for example for windows that are not composed).
fn window_frame(hwnd: HWND) -> Option<Rect> {
    let mut bounds = RECT::default();
    let dwm = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_EXTENDED_FRAME_BOUNDS,
            &mut bounds as *mut _ as *mut c_void,
            std::mem::size_of::<RECT>() as u32,
        )
    };
    if dwm.is_ok() {
        return Some(win32_rect_to_rect(&bounds));
    }

    let mut window_rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut window_rect) }.ok()?;
    Some(win32_rect_to_rect(&window_rect))
}

/// Visible, not minimised and not cloaked by DWM (other virtual desktops,
/// suspended UWP apps)
fn is_window_on_screen(hwnd: HWND) -> bool {
    unsafe {
        if !IsWindowVisible(hwnd).as_bool() || IsIconic(hwnd).as_bool() {
            return false;
        }

        let mut cloaked: u32 = 0;
        let result = DwmGetWindowAttribute(
            hwnd,
            DWMWA_CLOAKED,
            &mut cloaked as *mut _ as *mut c_void,
            std::mem::size_of::<u32>() as u32,
        );
        result.is_err() || cloaked == 0
    }
}

/// Opacity of layered windows using constant alpha, 1.0 otherwise
fn window_opacity(hwnd: HWND) -> f64 {
    unsafe {
        let ex_style = WINDOW_EX_STYLE(GetWindowLongW(hwnd, GWL_EXSTYLE) as u32);
        if (ex_style & WS_EX_LAYERED) == WINDOW_EX_STYLE(0) {
            return 1.0;
        }

        let mut alpha: u8 = 255;
        let mut flags = LAYERED_WINDOW_ATTRIBUTES_FLAGS(0);
        let result = GetLayeredWindowAttributes(
            hwnd,
            None,
            Some(&mut alpha as *mut u8),
            Some(&mut flags as *mut LAYERED_WINDOW_ATTRIBUTES_FLAGS),
        );

        // Per-pixel alpha layered windows report no constant alpha
        if result.is_ok() && (flags.0 & LWA_ALPHA.0) != 0 {
            alpha as f64 / 255.0
        } else {
            1.0
        }
    }
}

fn window_title(hwnd: HWND) -> Option<String> {
    let mut title_buffer = [0u16; 512];
    let title_length = unsafe { GetWindowTextW(hwnd, &mut title_buffer) };
    if title_length > 0 {
        Some(String::from_utf16_lossy(&title_buffer[..title_length as usize]))
    } else {
        None
    }
}

fn window_class_name(hwnd: HWND) -> String {
    let mut class_buffer = [0u16; 256];
    let class_length = unsafe { GetClassNameW(hwnd, &mut class_buffer) };
    if class_length > 0 {
        String::from_utf16_lossy(&class_buffer[..class_length as usize])
    } else {
        String::new()
    }
}

fn window_process_id(hwnd: HWND) -> u32 {
    let mut process_id: u32 = 0;
    unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut process_id as *mut u32));
    }
    process_id
}

/// Executable name of a process without extension, if it can be queried
fn process_image_name(process_id: u32) -> Option<String> {
    if process_id == 0 {
        return None;
    }

    unsafe {
        let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, process_id).ok()?;

        let mut buffer = [0u16; 1024];
        let mut length = buffer.len() as u32;
        let result = QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut length,
        );
        let _ = CloseHandle(process);
        result.ok()?;

        let path = String::from_utf16_lossy(&buffer[..length as usize]);
        Path::new(&path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}
