// Derived from code in LLVM, which is:
// Part of the LLVM Project, under the Apache License v2.0 with LLVM Exceptions.
// See https://llvm.org/LICENSE.txt for license information.
// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

/// Returns a multiple of `align` needed to store `size` bytes.
pub(crate) fn align_to(size: u64, align: u64) -> u64 {
    (size + align - 1) & !(align - 1)
}

/// Member headers always start on an even offset.
pub(crate) fn pad2(offset: u64) -> u64 {
    align_to(offset, 2)
}
