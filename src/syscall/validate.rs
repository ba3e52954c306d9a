//! Write buffers
//!
//! A `write` takes a raw address and a byte count. On the user side the pair
//! travels as a [`UserBuffer`], so the length can never drift from the
//! slice it came from. On the kernel side [`validate_user_read`] rebuilds the
//! view from the two registers and rejects what it can check.
//!
//! # Checks Performed at the Boundary
//! - Null pointer with a nonzero length
//! - Pointer + length overflowing the address space

use core::marker::PhantomData;

use super::SyscallError;

/// A bounds-known view of caller memory handed to `write`.
///
/// The lifetime ties the view to the memory it was built from; the trampoline
/// only reads `addr()` and `len()` when encoding.
#[derive(Clone, Copy)]
pub struct UserBuffer<'a> {
    ptr: *const u8,
    len: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> UserBuffer<'a> {
    /// Wrap a byte slice.
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
            _marker: PhantomData,
        }
    }

    /// Wrap a raw span without any checks.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `len` bytes for all of `'a`.
    #[inline]
    pub const unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    /// Address placed in the buffer slot.
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr as usize
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the buffer as a byte slice
    pub fn as_bytes(&self) -> &'a [u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY:
        // - `new` borrows a live slice for 'a
        // - `from_raw_parts` and `validate_user_read` push validity onto
        //   their callers for 'a
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl core::fmt::Debug for UserBuffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "UserBuffer({:#x}, {})", self.addr(), self.len)
    }
}

impl<'a> From<&'a [u8]> for UserBuffer<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<&'a str> for UserBuffer<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

/// Validate a buffer taken from the `ecx`/`edx` registers
///
/// # Returns
/// * `Ok(UserBuffer)` - Buffer passed the boundary checks
/// * `Err(SyscallError::Efault)` - Null pointer or address overflow
///
/// # Safety
/// Mapping cannot be checked here: the caller must know that a span passing
/// these checks is readable for `'a`.
pub unsafe fn validate_user_read<'a>(
    addr: usize,
    len: usize,
) -> Result<UserBuffer<'a>, SyscallError> {
    // Zero-length reads are valid
    if len == 0 {
        // SAFETY: nothing is ever read from an empty span
        return Ok(unsafe { UserBuffer::from_raw_parts(addr as *const u8, 0) });
    }

    if addr == 0 {
        return Err(SyscallError::Efault);
    }

    addr.checked_add(len).ok_or(SyscallError::Efault)?;

    // SAFETY: caller guarantees the span is mapped for 'a
    Ok(unsafe { UserBuffer::from_raw_parts(addr as *const u8, len) })
}
