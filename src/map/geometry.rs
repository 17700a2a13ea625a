use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Fill the interior of a projected polygon with even-odd scanline parity.
/// Crossings are counted across every ring, so holes stay unfilled — the
/// same parity rule the hit-tester uses, keeping highlight and hit agreed.
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<(i32, i32)>]) {
    let mut min_y = i32::MAX;
    let mut max_y = i32::MIN;
    for ring in rings {
        for &(_, y) in ring {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if min_y > max_y {
        return;
    }
    let min_y = min_y.max(0);
    let max_y = max_y.min(canvas.pixel_height() as i32 - 1);

    let mut crossings: Vec<i32> = Vec::new();
    for y in min_y..=max_y {
        // Sample between pixel rows so scanlines through vertices don't
        // double-count
        let scan = y as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                let (fyi, fyj) = (yi as f64, yj as f64);
                if (fyi > scan) != (fyj > scan) {
                    let t = (scan - fyi) / (fyj - fyi);
                    crossings.push((xi as f64 + t * (xj - xi) as f64).round() as i32);
                }
                j = i;
            }
        }

        crossings.sort_unstable();
        for pair in crossings.chunks_exact(2) {
            canvas.fill_span(y, pair[0], pair[1]);
        }
    }
}
