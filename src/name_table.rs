// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

use std::collections::HashMap;

use crate::error::{Error, Result};

/// The GNU `//` member: long names keyed by their byte offset in the table.
#[derive(Debug, Default)]
pub(crate) struct LongNameTable {
    names: HashMap<u64, Vec<u8>>,
}

impl LongNameTable {
    pub(crate) fn parse(content: &[u8]) -> Self {
        let mut names = HashMap::new();
        let mut position = 0;
        for entry in content.split(|&b| b == b'\n') {
            let name = entry.strip_suffix(b"/").unwrap_or(entry);
            names.insert(position, name.to_vec());
            position += u64::try_from(entry.len()).unwrap_or(u64::MAX) + 1;
        }
        LongNameTable { names }
    }

    pub(crate) fn resolve(&self, offset: u64) -> Result<&[u8]> {
        self.names.get(&offset).map(Vec::as_slice).ok_or_else(|| {
            Error::format(format!(
                "name references an offset absent from the index: {offset}"
            ))
        })
    }
}
