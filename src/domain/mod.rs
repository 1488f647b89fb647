// Domain layer: 記錄、階段結果與對外介面，不依賴任何 HTTP 實作。

pub mod model;
pub mod ports;
