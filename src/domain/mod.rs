// Domain layer: 模型與 ports（介面），不依賴任何硬體

pub mod model;
pub mod ports;
