//! Floating-window bookkeeping: geometry, stacking order, drag state,
//! minimize/maximize/close lifecycle. No DOM here; `desktop` applies the
//! results of these operations to the page.

/// Height of the system bar strip reserved at the top of the viewport.
pub const TOP_BAR_PX: f64 = 30.0;

/// Window position and size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone)]
pub struct WindowState {
    pub id: u32,
    pub title: String,
    pub geometry: Geometry,
    pub z: u32,
    pub minimized: bool,
    /// Geometry saved while maximized; `Some` means the window is maximized.
    pub saved: Option<Geometry>,
}

impl WindowState {
    pub fn is_maximized(&self) -> bool {
        self.saved.is_some()
    }
}

/// Result of a maximize toggle, to be applied to the window element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaximizeChange {
    /// Window now fills the desktop area; user resizing must be disabled.
    Maximized(Geometry),
    /// Prior geometry reapplied; user resizing re-enabled.
    Restored(Geometry),
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    id: u32,
    offset_x: f64,
    offset_y: f64,
}

/// All window state for the shell. One instance lives in the desktop's
/// thread-local; constructed explicitly so tests can own their own.
pub struct WindowManager {
    windows: Vec<WindowState>,
    next_id: u32,
    z_counter: u32,
    drag: Option<Drag>,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager {
    pub const fn new() -> Self {
        WindowManager {
            windows: Vec::new(),
            next_id: 1,
            z_counter: 1,
            drag: None,
        }
    }

    /// Allocate a window at a pseudo-random on-screen position. `r1`/`r2` are
    /// uniform samples in [0, 1); placement keeps the window inside the
    /// viewport minus fixed margins (25px sides, 50px top, 30px bottom).
    pub fn create(
        &mut self,
        title: &str,
        w: f64,
        h: f64,
        viewport_w: f64,
        viewport_h: f64,
        r1: f64,
        r2: f64,
    ) -> u32 {
        let x = r1 * (viewport_w - w - 50.0).max(0.0) + 25.0;
        let y = r2 * (viewport_h - h - 80.0).max(0.0) + 50.0;
        let id = self.next_id;
        self.next_id += 1;
        self.z_counter += 1;
        self.windows.push(WindowState {
            id,
            title: title.to_string(),
            geometry: Geometry { x, y, w, h },
            z: self.z_counter,
            minimized: false,
            saved: None,
        });
        id
    }

    pub fn get(&self, id: u32) -> Option<&WindowState> {
        self.windows.iter().find(|w| w.id == id)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut WindowState> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    /// Raise a window to the top of the stacking order.
    pub fn focus(&mut self, id: u32) -> Option<u32> {
        self.z_counter += 1;
        let z = self.z_counter;
        let win = self.get_mut(id)?;
        win.z = z;
        Some(z)
    }

    /// Begin dragging `id`, grabbed at the given offset from its corner.
    /// A drag already in progress keeps the pointer; only one window may be
    /// mid-drag at a time.
    pub fn begin_drag(&mut self, id: u32, offset_x: f64, offset_y: f64) {
        if self.drag.is_none() && self.get(id).is_some() {
            self.drag = Some(Drag {
                id,
                offset_x,
                offset_y,
            });
        }
    }

    /// Move the dragged window so the grab point follows the pointer. No
    /// bounds clamping: windows may be dragged off-screen. Returns the window
    /// id and its new position when a drag is active.
    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64) -> Option<(u32, f64, f64)> {
        let drag = self.drag?;
        let win = self.get_mut(drag.id)?;
        win.geometry.x = pointer_x - drag.offset_x;
        win.geometry.y = pointer_y - drag.offset_y;
        Some((drag.id, win.geometry.x, win.geometry.y))
    }

    pub fn end_drag(&mut self) -> Option<u32> {
        self.drag.take().map(|d| d.id)
    }

    /// Hide the window; the caller creates the matching tray entry.
    pub fn minimize(&mut self, id: u32) -> bool {
        match self.get_mut(id) {
            Some(win) => {
                win.minimized = true;
                true
            }
            None => false,
        }
    }

    /// Make a minimized window visible again and raise it.
    pub fn restore(&mut self, id: u32) -> Option<u32> {
        self.z_counter += 1;
        let z = self.z_counter;
        let win = self.get_mut(id)?;
        win.minimized = false;
        win.z = z;
        Some(z)
    }

    /// Two-state maximize toggle. First activation saves the current geometry
    /// and fills the desktop area below the top bar; second reapplies the
    /// saved geometry exactly.
    pub fn toggle_maximize(
        &mut self,
        id: u32,
        viewport_w: f64,
        viewport_h: f64,
    ) -> Option<MaximizeChange> {
        let win = self.get_mut(id)?;
        match win.saved.take() {
            Some(prior) => {
                win.geometry = prior;
                Some(MaximizeChange::Restored(prior))
            }
            None => {
                win.saved = Some(win.geometry);
                win.geometry = Geometry {
                    x: 0.0,
                    y: TOP_BAR_PX,
                    w: viewport_w,
                    h: viewport_h - TOP_BAR_PX,
                };
                Some(MaximizeChange::Maximized(win.geometry))
            }
        }
    }

    /// Remove the window entirely. Irreversible; also cancels a drag of the
    /// closed window so a stale grab cannot move a dead id.
    pub fn close(&mut self, id: u32) {
        self.windows.retain(|w| w.id != id);
        if self.drag.map(|d| d.id) == Some(id) {
            self.drag = None;
        }
    }

    pub fn minimized_ids(&self) -> Vec<u32> {
        self.windows
            .iter()
            .filter(|w| w.minimized)
            .map(|w| w.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(wm: &mut WindowManager) -> u32 {
        wm.create("win", 600.0, 400.0, 1280.0, 800.0, 0.5, 0.5)
    }

    #[test]
    fn test_stacking_order_strictly_increases() {
        let mut wm = WindowManager::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            let id = mk(&mut wm);
            seen.push(wm.get(id).unwrap().z);
        }
        let a = mk(&mut wm);
        let b = mk(&mut wm);
        seen.push(wm.focus(a).unwrap());
        seen.push(wm.focus(b).unwrap());
        seen.push(wm.focus(a).unwrap());
        for pair in seen.windows(2) {
            assert!(pair[1] > pair[0], "z values must strictly increase");
        }
    }

    #[test]
    fn test_placement_stays_in_viewport() {
        let mut wm = WindowManager::new();
        for r in [0.0, 0.25, 0.999] {
            let id = wm.create("win", 600.0, 400.0, 1280.0, 800.0, r, r);
            let g = wm.get(id).unwrap().geometry;
            assert!(g.x >= 25.0 && g.x + g.w <= 1280.0 - 25.0);
            assert!(g.y >= 50.0 && g.y + g.h <= 800.0 - 30.0);
        }
    }

    #[test]
    fn test_drag_follows_pointer_delta() {
        let mut wm = WindowManager::new();
        let id = mk(&mut wm);
        wm.begin_drag(id, 10.0, 5.0);
        let (moved, x, y) = wm.drag_to(100.0, 80.0).unwrap();
        assert_eq!(moved, id);
        assert_eq!((x, y), (90.0, 75.0));
        // No clamping: off-screen positions are allowed.
        let (_, x, _) = wm.drag_to(-500.0, 40.0).unwrap();
        assert_eq!(x, -510.0);
        assert_eq!(wm.end_drag(), Some(id));
        assert!(wm.drag_to(0.0, 0.0).is_none());
    }

    #[test]
    fn test_single_drag_at_a_time() {
        let mut wm = WindowManager::new();
        let a = mk(&mut wm);
        let b = mk(&mut wm);
        wm.begin_drag(a, 0.0, 0.0);
        wm.begin_drag(b, 0.0, 0.0);
        let (moved, _, _) = wm.drag_to(10.0, 10.0).unwrap();
        assert_eq!(moved, a);
    }

    #[test]
    fn test_minimize_restore_round_trip() {
        let mut wm = WindowManager::new();
        let id = mk(&mut wm);
        let z_before = wm.get(id).unwrap().z;
        assert!(wm.minimize(id));
        assert_eq!(wm.minimized_ids(), vec![id]);
        let z = wm.restore(id).unwrap();
        assert!(wm.minimized_ids().is_empty());
        assert!(z > z_before, "restore must raise the window");
    }

    #[test]
    fn test_close_minimized_window() {
        let mut wm = WindowManager::new();
        let id = mk(&mut wm);
        wm.minimize(id);
        wm.close(id);
        assert!(wm.is_empty());
        assert!(wm.minimized_ids().is_empty());
        assert!(wm.restore(id).is_none());
    }

    #[test]
    fn test_close_cancels_own_drag() {
        let mut wm = WindowManager::new();
        let id = mk(&mut wm);
        wm.begin_drag(id, 0.0, 0.0);
        wm.close(id);
        assert!(wm.drag_to(50.0, 50.0).is_none());
    }

    #[test]
    fn test_maximize_restore_exact_geometry() {
        let mut wm = WindowManager::new();
        let id = wm.create("win", 300.0, 200.0, 1024.0, 768.0, 0.37, 0.81);
        wm.begin_drag(id, 0.0, 0.0);
        wm.drag_to(-17.5, 912.25); // arbitrary prior geometry, off-screen is fine
        wm.end_drag();
        let before = wm.get(id).unwrap().geometry;

        let max = wm.toggle_maximize(id, 1024.0, 768.0).unwrap();
        assert_eq!(
            max,
            MaximizeChange::Maximized(Geometry {
                x: 0.0,
                y: TOP_BAR_PX,
                w: 1024.0,
                h: 768.0 - TOP_BAR_PX,
            })
        );
        assert!(wm.get(id).unwrap().is_maximized());

        let restored = wm.toggle_maximize(id, 1024.0, 768.0).unwrap();
        assert_eq!(restored, MaximizeChange::Restored(before));
        assert_eq!(wm.get(id).unwrap().geometry, before);
        assert!(!wm.get(id).unwrap().is_maximized());
    }
}
