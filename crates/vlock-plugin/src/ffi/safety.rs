//! FFI safety wrappers: converts module exports into Rust values.

use std::ffi::CStr;
use std::os::raw::c_char;

/// Copies a null-terminated array of C strings.
///
/// A null `table` is an empty list. Entries that are not valid UTF-8 are
/// converted lossily.
///
/// # Safety
/// `table` must be null or point at an array of pointers to
/// null-terminated strings that ends with a null pointer.
pub unsafe fn read_string_table(table: *const *const c_char) -> Vec<String> {
    let mut names = Vec::new();

    if table.is_null() {
        return names;
    }

    let mut cursor = table;
    loop {
        // SAFETY: the caller guarantees the array is null-terminated, so
        // every position up to and including the terminator is readable.
        let entry = unsafe { *cursor };
        if entry.is_null() {
            break;
        }
        // SAFETY: non-null entries are null-terminated strings.
        let name = unsafe { CStr::from_ptr(entry) };
        names.push(name.to_string_lossy().into_owned());
        // SAFETY: the terminator has not been reached yet.
        cursor = unsafe { cursor.add(1) };
    }

    names
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;
    use crate::ffi::abi::DependencyTable;

    #[test]
    fn null_table_is_empty() {
        let names = unsafe { read_string_table(ptr::null()) };
        assert!(names.is_empty());
    }

    #[test]
    fn reads_until_terminator() {
        let table = DependencyTable::new([
            c"all".as_ptr(),
            c"new".as_ptr(),
            ptr::null(),
            c"hidden".as_ptr(),
        ]);

        let names = unsafe { read_string_table(table.as_ptr()) };

        assert_eq!(names, ["all", "new"]);
    }
}
