//! Routing of application extensions to dedicated handlers.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    records::{
        ApplicationDescriptor, GraphicsControlExtension, ImageDescriptor,
        LogicalScreenDescriptor, Version,
    },
    visitor::{BlockVisitor, RawImageVisitor, Visitor},
    Result,
};

/// The application extension carrying the animation loop count.
pub const NETSCAPE: ApplicationDescriptor = ApplicationDescriptor::new(*b"NETSCAPE", *b"2.0");

/// Wraps a [Visitor], and hands application extensions to the handler registered for their
/// descriptor instead.
///
/// Application extensions without a handler, and every other event, go to the wrapped visitor.
///
/// ```
/// use gifstream::{Applications, NetscapeLoop, Parser, Visitor, NETSCAPE};
///
/// struct Nothing;
/// impl Visitor for Nothing {}
///
/// let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00\
///             \x21\xff\x0bNETSCAPE2.0\x03\x01\x05\x00\x00\
///             \x3b";
///
/// let mut netscape = NetscapeLoop::default();
/// let mut visitor = Applications::new(Nothing);
/// visitor.register(NETSCAPE, &mut netscape);
/// Parser::from_reader(&gif[..]).accept(&mut visitor).unwrap();
/// drop(visitor);
///
/// assert_eq!(netscape.loop_count(), Some(5));
/// ```
pub struct Applications<'h, V> {
    visitor: V,
    handlers: IndexMap<ApplicationDescriptor, &'h mut dyn BlockVisitor>,
}

impl<'h, V: Visitor> Applications<'h, V> {
    pub fn new(visitor: V) -> Self {
        Self {
            visitor,
            handlers: IndexMap::new(),
        }
    }

    /// Routes the application extensions matching `descriptor` to `handler`, replacing the
    /// previous handler for that descriptor.
    pub fn register(
        &mut self,
        descriptor: ApplicationDescriptor,
        handler: &'h mut dyn BlockVisitor,
    ) -> &mut Self {
        self.handlers.insert(descriptor, handler);
        self
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> Vec<ApplicationDescriptor> {
        self.handlers.keys().copied().collect()
    }

    pub fn into_inner(self) -> V {
        self.visitor
    }
}

impl<V: Visitor> Visitor for Applications<'_, V> {
    fn visit_header(&mut self, version: Version) -> Result<()> {
        self.visitor.visit_header(version)
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        self.visitor.visit_logical_screen_descriptor(descriptor)
    }

    fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        self.visitor.visit_global_color_table(index, color)
    }

    fn visit_graphics_control_extension(
        &mut self,
        extension: &GraphicsControlExtension,
    ) -> Result<()> {
        self.visitor.visit_graphics_control_extension(extension)
    }

    fn visit_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        if let Some(handler) = self.handlers.get_mut(descriptor) {
            debug!(
                identifier = %String::from_utf8_lossy(&descriptor.identifier),
                "routing application extension"
            );
            return Ok(Some(Box::new(&mut **handler)));
        }
        self.visitor.visit_application(descriptor)
    }

    fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.visitor.visit_comment()
    }

    fn visit_plain_text(&mut self, header: &[u8]) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.visitor.visit_plain_text(header)
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        self.visitor.visit_image(descriptor)
    }

    fn visit_end(&mut self) -> Result<()> {
        self.visitor.visit_end()
    }
}

/// Reads the loop count of a `NETSCAPE2.0` application extension.
#[derive(Debug, Default)]
pub struct NetscapeLoop {
    loop_count: Option<u16>,
}

impl NetscapeLoop {
    const LOOP_SUB_BLOCK: u8 = 1;

    /// How many times the animation repeats, 0 meaning forever. `None` until a loop sub-block was
    /// read.
    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }
}

impl BlockVisitor for NetscapeLoop {
    fn visit_block(&mut self, block: &[u8]) -> Result<()> {
        if let &[Self::LOOP_SUB_BLOCK, low, high] = block {
            let loop_count = u16::from(low) | u16::from(high) << 8;
            debug!(loop_count, "netscape loop");
            self.loop_count = Some(loop_count);
        }
        Ok(())
    }
}
