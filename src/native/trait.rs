use crate::error::Result;
use crate::events::{RawEvent, WindowId};

pub type Atom = u32;

/// Открывает соединение с дисплеем. Закрытие соединения - это его Drop.
pub trait DisplayOpener {
    type Connection: NativeConnection;

    /// `display_name == None` означает `$DISPLAY`
    fn open(&self, display_name: Option<&str>) -> Result<Self::Connection>;
}

/// Примитивы оконной системы, которые потребляет ядро маршрутизации.
///
/// Буферы, выделенные сервером (значения свойств, списки детей),
/// возвращаются как владеющие значения и освобождаются через Drop.
pub trait NativeConnection {
    /// Major opcode расширения или `None`, если сервер его не знает
    fn extension_opcode(&self, name: &str) -> Result<Option<u8>>;

    /// Согласование версии XInput2: возвращает версию, поддерживаемую сервером
    fn query_version(&self, major: u16, minor: u16) -> Result<(u16, u16)>;

    /// Число событий, уже стоящих в очереди. Никогда не блокирует.
    /// Ошибка означает, что соединение сломано; события, прочитанные до
    /// ошибки, остаются доступны через `next_event`.
    fn queued_events(&mut self) -> Result<usize>;

    /// События, уже перенесённые из соединения в локальный буфер
    fn buffered_events(&self) -> usize;

    /// Снимает следующее уже поставленное в очередь событие. Никогда не блокирует.
    fn next_event(&mut self) -> Option<RawEvent>;

    fn default_root(&self) -> WindowId;

    fn intern_atom(&self, name: &str, only_if_exists: bool) -> Result<Option<Atom>>;

    /// Первое значение свойства типа CARDINAL/32, если оно есть
    fn cardinal_property(&self, window: WindowId, atom: Atom) -> Result<Option<u32>>;

    /// Непосредственные дети окна
    fn query_tree(&self, window: WindowId) -> Result<Vec<WindowId>>;

    fn select_touch_events(&self, window: WindowId) -> Result<()>;

    fn deselect_touch_events(&self, window: WindowId) -> Result<()>;
}
