/*
Output Level Law
================

Levels on the front panel run 0..=99, but the hardware does not treat them
linearly. Each internal step is roughly 0.75 dB, and the bottom of the range
falls away faster than the rest so that level 0 is properly silent.

  scaled
   127 ┤                          ╱
       │                      ╱
    48 ┤               ●──╱        28 + level  (level >= 20)
    46 ┤            ●
       │      ●●●●
       │   ●●          LUT         (level < 20)
     0 ┼●──────────────────────────→ level
       0          19 20          99

Target levels are blended with the per-operator output level (already in
microsteps, i.e. `scaled << 5`) and shifted into the 16.16 domain used by the
envelope state machine.
*/

/// Non-linear low end of the output level curve.
pub const LEVEL_LUT: [i32; 20] = [
    0, 5, 9, 13, 17, 20, 23, 25, 27, 29, 31, 33, 35, 37, 39, 41, 42, 43, 45, 46,
];

/// Offset removing the full-scale bias from the blended level.
pub const LEVEL_OFFSET: i32 = 4256;

/// Lowest target the blend may produce (before the 16-bit shift).
pub const MIN_TARGET: i32 = 16;

/// Map a nominal level (0..=127) onto the hardware's scaled level.
///
/// Negative inputs are treated as 0.
#[inline]
pub fn scale_output_level(level: i32) -> i32 {
    if level >= 20 {
        28 + level
    } else {
        LEVEL_LUT[level.max(0) as usize]
    }
}

/// Blend a phase level (0..=99) with an operator output level into a
/// 16.16 fixed-point target.
#[inline]
pub fn target_level(phase_level: i32, output_level: i32) -> i32 {
    let actual = scale_output_level(phase_level) >> 1;
    let actual = (actual << 6) + output_level - LEVEL_OFFSET;
    actual.max(MIN_TARGET) << 16
}
